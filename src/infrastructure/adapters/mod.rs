//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod combiner;
pub mod storage;
pub mod tts;

pub use combiner::*;
pub use storage::*;
pub use tts::*;
