//! Fake Speech Client - 用于本地调试和测试的语音客户端
//!
//! 不实际调用语音服务：返回固定音频文件，或生成一段 PCM 内容即文本字节的 WAV

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::{SpeechEnginePort, SpeechError, SpeechRequest, SpeechResponse};
use crate::domain::AudioFormat;
use crate::infrastructure::adapters::combiner::build_wav;

/// Fake Speech Client 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechClientConfig {
    /// 固定返回的音频文件路径；None 时按文本生成 WAV
    pub audio_file_path: Option<PathBuf>,
    /// 生成 WAV 的采样率
    pub sample_rate: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeSpeechClientConfig {
    fn default() -> Self {
        Self {
            audio_file_path: None,
            sample_rate: 24000,
            latency_ms: 0,
        }
    }
}

/// Fake Speech Client
pub struct FakeSpeechClient {
    config: FakeSpeechClientConfig,
    /// 缓存的固定音频
    audio_data: Option<Vec<u8>>,
}

impl FakeSpeechClient {
    /// 创建新的 FakeSpeechClient
    pub fn new(config: FakeSpeechClientConfig) -> Result<Self, std::io::Error> {
        let audio_data = match &config.audio_file_path {
            Some(path) => Some(std::fs::read(path)?),
            None => None,
        };

        tracing::info!(
            path = ?config.audio_file_path,
            sample_rate = config.sample_rate,
            "FakeSpeechClient initialized"
        );

        Ok(Self { config, audio_data })
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self {
            config: FakeSpeechClientConfig::default(),
            audio_data: None,
        }
    }

    /// 16 位单声道 WAV，PCM 数据为文本的 UTF-8 字节（补齐到偶数长度）
    fn text_to_wav(&self, text: &str) -> Vec<u8> {
        let mut pcm = text.as_bytes().to_vec();
        if pcm.len() % 2 != 0 {
            pcm.push(0);
        }
        build_wav(1, self.config.sample_rate, 16, &pcm)
    }
}

#[async_trait]
impl SpeechEnginePort for FakeSpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            "FakeSpeechClient: returning canned audio"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let response = match &self.audio_data {
            Some(data) => SpeechResponse {
                audio_data: data.clone(),
                format: request.format,
            },
            None => SpeechResponse {
                audio_data: self.text_to_wav(&request.text),
                format: AudioFormat::Wav,
            },
        };

        Ok(response)
    }
}
