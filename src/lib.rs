//! Duetto - 双人对话脚本语音合成
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Script Context: `Speaker X: ...` 脚本解析
//! - Voice Context: 说话人 → 音色人设
//!
//! 应用层 (application/):
//! - Ports: SpeechEngine, SegmentStore, AudioCombiner
//! - Commands: 合成命令与流水线编排
//! - ArtifactScope: 单次请求临时产物的生命周期
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: OpenAI 兼容语音客户端, 临时文件存储, ffmpeg / WAV 拼接

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
