//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色目录与对话风格
//! - 说话人 → 音色人设（音色 + 表达指令）

mod resolver;
mod value_objects;

pub use resolver::{resolve_voice, VoiceResolver, DEFAULT_FIRST_SPEAKER, DEFAULT_SECOND_SPEAKER};
pub use value_objects::{ConversationStyle, SpeakerRole, VoiceName, VoicePersona};
