//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Health DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 语音服务是否可达
    pub speech_engine: bool,
    /// 当前拼接后端
    pub combiner: &'static str,
}

// ============================================================================
// TTS DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub script: String,
    /// 对话风格；兼容旧字段名 speaker_type
    #[serde(default, alias = "speaker_type")]
    pub conversation_style: Option<String>,
}
