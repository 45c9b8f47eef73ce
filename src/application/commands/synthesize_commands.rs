//! Synthesize Commands - 脚本合成命令

use crate::domain::AudioFormat;

/// 合成对话脚本
#[derive(Debug, Clone)]
pub struct SynthesizeSpeech {
    /// 原始脚本（每行 `Speaker X: ...`）
    pub script: String,
    /// 对话风格，None 表示默认
    pub conversation_style: Option<String>,
}

impl SynthesizeSpeech {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            conversation_style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.conversation_style = Some(style.into());
        self
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizeSpeechResponse {
    /// 合并后的完整音频
    pub audio_data: Vec<u8>,
    pub format: AudioFormat,
    /// 合成的轮次数
    pub turn_count: usize,
}
