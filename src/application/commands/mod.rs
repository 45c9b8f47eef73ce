//! Commands - CQRS 命令
//!
//! 包含命令定义和处理器

pub mod handlers;
mod synthesize_commands;

pub use synthesize_commands::{SynthesizeSpeech, SynthesizeSpeechResponse};
