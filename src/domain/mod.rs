//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Script Context: 对话脚本解析
//! - Voice Context: 音色分配

pub mod script;
pub mod voice;

mod audio;

pub use audio::AudioFormat;
