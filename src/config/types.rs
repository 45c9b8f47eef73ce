//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::voice::{DEFAULT_FIRST_SPEAKER, DEFAULT_SECOND_SPEAKER};
use crate::domain::AudioFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频拼接配置
    #[serde(default)]
    pub combiner: CombinerConfig,

    /// 临时存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 脚本解析配置
    #[serde(default)]
    pub script: ScriptConfig,

    /// 说话人配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体大小上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// 语音合成后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// OpenAI 兼容的 HTTP 接口
    #[default]
    OpenAi,
    /// 本地假客户端，不访问网络
    Fake,
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsProvider::OpenAi => write!(f, "openai"),
            TtsProvider::Fake => write!(f, "fake"),
        }
    }
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// 服务基础 URL（含 /v1）
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// API Key，未设置时读取 OPENAI_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// 模型名称
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 片段与输出的音频格式
    #[serde(default)]
    pub response_format: AudioFormat,

    /// fake provider 固定返回的音频文件
    #[serde(default)]
    pub fake_audio_path: Option<PathBuf>,
}

fn default_tts_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_tts_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            url: default_tts_url(),
            api_key: None,
            model: default_tts_model(),
            timeout_secs: default_tts_timeout(),
            response_format: AudioFormat::default(),
            fake_audio_path: None,
        }
    }
}

/// 拼接后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinerBackend {
    #[default]
    Ffmpeg,
    Wav,
}

impl std::fmt::Display for CombinerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombinerBackend::Ffmpeg => write!(f, "ffmpeg"),
            CombinerBackend::Wav => write!(f, "wav"),
        }
    }
}

/// 音频拼接配置
#[derive(Debug, Clone, Deserialize)]
pub struct CombinerConfig {
    #[serde(default)]
    pub backend: CombinerBackend,

    /// ffmpeg 可执行文件路径
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            backend: CombinerBackend::default(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// 临时存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 临时片段目录
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
        }
    }
}

/// 脚本解析配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptConfig {
    /// 严格模式：遇到无法识别的行时报错
    #[serde(default)]
    pub strict: bool,
}

/// 说话人配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_first_speaker")]
    pub first_speaker: String,

    #[serde(default = "default_second_speaker")]
    pub second_speaker: String,
}

fn default_first_speaker() -> String {
    DEFAULT_FIRST_SPEAKER.to_string()
}

fn default_second_speaker() -> String {
    DEFAULT_SECOND_SPEAKER.to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            first_speaker: default_first_speaker(),
            second_speaker: default_second_speaker(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
