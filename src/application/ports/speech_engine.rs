//! Speech Engine Port - 语音合成引擎抽象
//!
//! 定义单次语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{VoiceName, VoicePersona};
use crate::domain::AudioFormat;

/// 语音合成错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service error: HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 语音合成请求
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    /// 要合成的文本
    pub text: String,
    /// 音色
    pub voice: VoiceName,
    /// 表达风格指令（可选）
    pub instructions: Option<String>,
    /// 期望的音频格式
    pub format: AudioFormat,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, persona: VoicePersona, format: AudioFormat) -> Self {
        let instructions = Some(persona.instructions).filter(|s| !s.is_empty());
        Self {
            text: text.into(),
            voice: persona.voice,
            instructions,
            format,
        }
    }
}

/// 语音合成响应
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// 原始音频数据
    pub audio_data: Vec<u8>,
    /// 音频格式
    pub format: AudioFormat,
}

/// Speech Engine Port
///
/// 每个发言轮次调用一次；不缓存、不重试
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechError>;

    /// 检查语音服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
