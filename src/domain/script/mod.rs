//! Script Context - 对话脚本
//!
//! 职责:
//! - 将 "Speaker X: ..." 格式的脚本拆分为有序的发言轮次
//! - 宽松 / 严格两种解析模式

mod errors;
mod parser;
mod value_objects;

pub use errors::ScriptError;
pub use parser::{parse_script, ParseMode, ScriptParser};
pub use value_objects::Turn;
