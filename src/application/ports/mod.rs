//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_combiner;
mod segment_store;
mod speech_engine;

pub use audio_combiner::{AudioCombinerPort, CombineError};
pub use segment_store::{PurgeReport, SegmentHandle, SegmentStorePort, StoreError};
pub use speech_engine::{SpeechEnginePort, SpeechError, SpeechRequest, SpeechResponse};
