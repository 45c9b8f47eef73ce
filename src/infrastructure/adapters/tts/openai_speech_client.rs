//! OpenAI Speech Client - 调用 OpenAI 兼容的语音合成接口
//!
//! 实现 SpeechEnginePort trait
//!
//! 外部 API:
//! POST {base_url}/audio/speech
//! Request: {"model": "...", "voice": "...", "input": "...", "instructions": "...", "response_format": "mp3"}
//! Response: 音频二进制

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechEnginePort, SpeechError, SpeechRequest, SpeechResponse};
use crate::domain::voice::VoiceName;
use crate::domain::AudioFormat;

/// 语音合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeechHttpRequest<'a> {
    model: &'a str,
    voice: VoiceName,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    response_format: AudioFormat,
}

/// OpenAI 语音客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiSpeechClientConfig {
    /// API 基础 URL（含 /v1）
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for OpenAiSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini-tts".to_string(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiSpeechClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OpenAI 语音客户端
pub struct OpenAiSpeechClient {
    client: Client,
    config: OpenAiSpeechClientConfig,
}

impl OpenAiSpeechClient {
    /// 创建新的客户端
    pub fn new(config: OpenAiSpeechClientConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取合成 URL
    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/models", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechEnginePort for OpenAiSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        let http_request = SpeechHttpRequest {
            model: &self.config.model,
            voice: request.voice,
            input: &request.text,
            instructions: request.instructions.as_deref(),
            response_format: request.format,
        };

        tracing::debug!(
            url = %self.speech_url(),
            model = %self.config.model,
            voice = %request.voice,
            text_len = request.text.len(),
            "Sending speech request"
        );

        let response = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.config.api_key)
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else if e.is_connect() {
                    SpeechError::Network(format!("Cannot connect to speech service: {}", e))
                } else {
                    SpeechError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, error_text));
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "Speech service returned an empty body".to_string(),
            ));
        }

        tracing::info!(
            voice = %request.voice,
            audio_size = audio_data.len(),
            "Speech synthesis completed"
        );

        Ok(SpeechResponse {
            audio_data,
            format: request.format,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn map_status_error(status: StatusCode, body: String) -> SpeechError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SpeechError::Unauthorized(format!("HTTP {}: {}", status, body))
        }
        _ => SpeechError::Service {
            status: status.as_u16(),
            body,
        },
    }
}
