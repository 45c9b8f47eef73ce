//! 应用层错误定义
//!
//! 流水线的致命错误；清理失败不在此列（只记录日志）

use thiserror::Error;

use crate::application::ports::{CombineError, SpeechError, StoreError};
use crate::domain::script::ScriptError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 脚本无可用轮次或严格模式下有无法识别的行
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// 某一轮次的语音合成失败
    #[error("Speech synthesis failed for turn {turn_index} (speaker {speaker_id}): {source}")]
    Synthesis {
        turn_index: usize,
        speaker_id: String,
        #[source]
        source: SpeechError,
    },

    /// 音频拼接失败
    #[error("Audio combine failed: {0}")]
    Combine(#[from] CombineError),

    /// 临时片段读写失败
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ApplicationError {
    /// 失败的轮次索引（仅合成错误）
    pub fn turn_index(&self) -> Option<usize> {
        match self {
            Self::Synthesis { turn_index, .. } => Some(*turn_index),
            _ => None,
        }
    }
}
