//! Application State
//!
//! 所有请求共享的 Handler 与端口

use std::sync::Arc;

use crate::application::{AudioCombinerPort, SpeechEnginePort, SynthesizeSpeechHandler};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub speech_engine: Arc<dyn SpeechEnginePort>,
    pub combiner: Arc<dyn AudioCombinerPort>,

    // ========== Command Handlers ==========
    pub synthesize_handler: SynthesizeSpeechHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        speech_engine: Arc<dyn SpeechEnginePort>,
        combiner: Arc<dyn AudioCombinerPort>,
        synthesize_handler: SynthesizeSpeechHandler,
    ) -> Self {
        Self {
            speech_engine,
            combiner,
            synthesize_handler,
        }
    }
}
