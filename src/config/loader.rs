//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError as ConfigCrateError, Environment,
    File,
};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CombinerBackend, TtsProvider};
use crate::domain::AudioFormat;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `DUETTO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值（部分默认值可由通用环境变量提供）
///
/// # 环境变量示例
/// - `DUETTO_SERVER__PORT=8080`
/// - `DUETTO_TTS__API_KEY=sk-...`
/// - `DUETTO_TTS__PROVIDER=fake`
/// - `DUETTO_COMBINER__BACKEND=wav`
///
/// 通用环境变量 `OPENAI_API_KEY`、`FFMPEG_PATH`、`TEMP_DIR` 作为默认值使用
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3001)?
        .set_default("server.max_body_bytes", 5 * 1024 * 1024)?
        .set_default("tts.provider", "openai")?
        .set_default("tts.url", "https://api.openai.com/v1")?
        .set_default("tts.model", "gpt-4o-mini-tts")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.response_format", "mp3")?
        .set_default("combiner.backend", "ffmpeg")?
        .set_default("script.strict", false)?
        .set_default("voice.first_speaker", "R")?
        .set_default("voice.second_speaker", "S")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;
    builder = apply_env_fallbacks(builder, |name| std::env::var(name).ok())?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: DUETTO_TTS__URL=http://localhost:8880/v1
    builder = builder.add_source(
        Environment::with_prefix("DUETTO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 通用环境变量作为默认值，配置文件和 DUETTO_ 变量仍可覆盖
fn apply_env_fallbacks(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let fallbacks = [
        ("tts.api_key", "OPENAI_API_KEY", None),
        ("combiner.ffmpeg_path", "FFMPEG_PATH", Some("ffmpeg")),
        ("storage.temp_dir", "TEMP_DIR", Some("temp")),
    ];

    for (key, var, default) in fallbacks {
        match (lookup(var).filter(|v| !v.is_empty()), default) {
            (Some(value), _) => builder = builder.set_default(key, value)?,
            (None, Some(default)) => builder = builder.set_default(key, default)?,
            (None, None) => {}
        }
    }

    Ok(builder)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.model.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS model cannot be empty".to_string(),
        ));
    }

    if config.tts.provider == TtsProvider::OpenAi
        && config.tts.api_key.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "TTS API key is required for the openai provider (set DUETTO_TTS__API_KEY or OPENAI_API_KEY)"
                .to_string(),
        ));
    }

    if config.combiner.backend == CombinerBackend::Wav
        && config.tts.response_format != AudioFormat::Wav
    {
        return Err(ConfigError::ValidationError(
            "The wav combiner requires tts.response_format = \"wav\"".to_string(),
        ));
    }

    if config.storage.temp_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Temp directory cannot be empty".to_string(),
        ));
    }

    let first = config.voice.first_speaker.trim();
    let second = config.voice.second_speaker.trim();
    if first.is_empty() || second.is_empty() {
        return Err(ConfigError::ValidationError(
            "Speaker ids cannot be empty".to_string(),
        ));
    }
    if first == second {
        return Err(ConfigError::ValidationError(format!(
            "First and second speaker must differ (both are '{}')",
            first
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Body Size: {} bytes", config.server.max_body_bytes);
    tracing::info!("TTS Provider: {}", config.tts.provider);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Model: {}", config.tts.model);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("TTS API Key: {}", if config.tts.api_key.is_some() { "set" } else { "unset" });
    tracing::info!("Audio Format: {}", config.tts.response_format);
    tracing::info!("Combiner: {}", config.combiner.backend);
    if config.combiner.backend == CombinerBackend::Ffmpeg {
        tracing::info!("FFmpeg Path: {:?}", config.combiner.ffmpeg_path);
    }
    tracing::info!("Temp Directory: {:?}", config.storage.temp_dir);
    tracing::info!("Strict Script Parsing: {}", config.script.strict);
    tracing::info!(
        "Speakers: {} / {}",
        config.voice.first_speaker,
        config.voice.second_speaker
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
