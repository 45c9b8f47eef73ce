//! Script Context - Value Objects

use serde::Serialize;

/// 一个发言轮次
///
/// 不变量:
/// - text 去除首尾空白后非空
/// - index 为该轮次在脚本中的顺序位置（从 0 连续递增）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub speaker_id: String,
    pub text: String,
    pub index: usize,
}

impl Turn {
    pub fn new(speaker_id: impl Into<String>, text: impl Into<String>, index: usize) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            text: text.into(),
            index,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
