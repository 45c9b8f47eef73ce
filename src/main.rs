//! Duetto - 双人对话脚本语音合成服务
//!
//! 启动流程: 配置 → 日志 → 适配器 → 合成 Handler → HTTP 服务

use std::sync::Arc;

use duetto::application::{
    AudioCombinerPort, SegmentStorePort, SpeechEnginePort, SynthesizeSpeechHandler,
};
use duetto::config::{load_config, print_config, AppConfig, CombinerBackend, TtsProvider};
use duetto::domain::script::ScriptParser;
use duetto::domain::voice::VoiceResolver;
use duetto::infrastructure::adapters::{
    FakeSpeechClient, FakeSpeechClientConfig, FfmpegCombiner, OpenAiSpeechClient,
    OpenAiSpeechClientConfig, TempSegmentStore, WavConcatCombiner,
};
use duetto::infrastructure::http::{AppState, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Duetto - dialogue script speech synthesis");
    print_config(&config);

    // 临时片段目录在启动时创建一次
    let segment_store: Arc<dyn SegmentStorePort> = Arc::new(
        TempSegmentStore::new(&config.storage.temp_dir, config.tts.response_format).await?,
    );

    let speech_engine = build_speech_engine(&config)?;
    let combiner = build_combiner(&config).await;

    let parser = if config.script.strict {
        ScriptParser::strict()
    } else {
        ScriptParser::lenient()
    };
    let resolver = VoiceResolver::new(
        config.voice.first_speaker.trim(),
        config.voice.second_speaker.trim(),
    );

    let synthesize_handler =
        SynthesizeSpeechHandler::new(speech_engine.clone(), segment_store, combiner.clone())
            .with_parser(parser)
            .with_resolver(resolver)
            .with_format(config.tts.response_format);

    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(config.server.max_body_bytes);
    let state = AppState::new(speech_engine, combiner, synthesize_handler);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志；RUST_LOG 优先于配置
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},duetto={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

fn build_speech_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechEnginePort>> {
    let engine: Arc<dyn SpeechEnginePort> = match config.tts.provider {
        TtsProvider::OpenAi => {
            let api_key = config.tts.api_key.clone().unwrap_or_default();
            let client_config = OpenAiSpeechClientConfig::new(&config.tts.url, api_key)
                .with_model(&config.tts.model)
                .with_timeout(config.tts.timeout_secs);
            Arc::new(OpenAiSpeechClient::new(client_config)?)
        }
        TtsProvider::Fake => {
            tracing::warn!("Using fake speech client, no audio will be synthesized");
            let client_config = FakeSpeechClientConfig {
                audio_file_path: config.tts.fake_audio_path.clone(),
                ..Default::default()
            };
            Arc::new(FakeSpeechClient::new(client_config)?)
        }
    };

    Ok(engine)
}

async fn build_combiner(config: &AppConfig) -> Arc<dyn AudioCombinerPort> {
    match config.combiner.backend {
        CombinerBackend::Ffmpeg => {
            let combiner = FfmpegCombiner::new(&config.combiner.ffmpeg_path);
            // 不阻止启动：请求时会返回 ToolUnavailable
            if let Err(e) = combiner.check_available().await {
                tracing::warn!(error = %e, "FFmpeg is not available, synthesis requests will fail");
            }
            Arc::new(combiner)
        }
        CombinerBackend::Wav => Arc::new(WavConcatCombiner::new()),
    }
}
