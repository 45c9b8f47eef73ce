//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechEngine、SegmentStore、AudioCombiner）
//! - commands: 合成命令及处理器（流水线编排）
//! - artifact_scope: 单次请求的临时产物生命周期
//! - error: 应用层错误定义

pub mod artifact_scope;
pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use artifact_scope::ArtifactScope;
pub use commands::{handlers::SynthesizeSpeechHandler, SynthesizeSpeech, SynthesizeSpeechResponse};
pub use error::ApplicationError;
pub use ports::{
    AudioCombinerPort, CombineError, PurgeReport, SegmentHandle, SegmentStorePort, SpeechEnginePort,
    SpeechError, SpeechRequest, SpeechResponse, StoreError,
};
