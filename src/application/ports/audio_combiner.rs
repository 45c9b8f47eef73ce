//! Audio Combiner Port - 音频拼接抽象
//!
//! 按给定顺序首尾拼接多个音频片段，不做淡入淡出、不做音量归一化

use async_trait::async_trait;
use thiserror::Error;

use super::SegmentHandle;

/// 拼接错误
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("No input segments to combine")]
    NoInputs,

    #[error("Input segment missing: {0}")]
    MissingInput(String),

    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: String, reason: String },

    #[error("Input format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Media tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Media tool failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Combiner Port
#[async_trait]
pub trait AudioCombinerPort: Send + Sync {
    /// 将 `inputs` 按顺序拼接写入 `output`，成功时返回 `output`
    async fn combine(
        &self,
        inputs: &[SegmentHandle],
        output: SegmentHandle,
    ) -> Result<SegmentHandle, CombineError>;

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}
