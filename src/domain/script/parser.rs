//! 脚本解析器
//!
//! 逐行匹配 `Speaker <id>: <text>`，每行一个轮次（不跨行续写）

use regex::Regex;
use std::sync::LazyLock;

use super::{ScriptError, Turn};

/// 发言行格式：`Speaker`、至少一个空白、字母数字 ID、冒号、正文
static SPEAKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Speaker\s+([A-Za-z0-9]+):\s*(.*)$").expect("speaker line pattern is valid")
});

/// 解析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// 忽略不匹配的行
    #[default]
    Lenient,
    /// 遇到不匹配的非空行即报错
    Strict,
}

/// 脚本解析器
#[derive(Debug, Clone, Default)]
pub struct ScriptParser {
    mode: ParseMode,
}

impl ScriptParser {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub fn lenient() -> Self {
        Self::new(ParseMode::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(ParseMode::Strict)
    }

    /// 解析脚本，至少产出一个轮次
    ///
    /// 空结果返回 `ScriptError::NoTurns`；严格模式下首个无法识别的行返回
    /// `ScriptError::UnrecognizedLine`（行号从 1 开始）
    pub fn parse(&self, script: &str) -> Result<Vec<Turn>, ScriptError> {
        let mut turns = Vec::new();

        for (line_idx, line) in script.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match match_line(line) {
                Some((speaker_id, text)) => {
                    // 前缀后为空的行不合成
                    if text.is_empty() {
                        continue;
                    }
                    let index = turns.len();
                    turns.push(Turn::new(speaker_id, text, index));
                }
                None if self.mode == ParseMode::Strict => {
                    return Err(ScriptError::UnrecognizedLine {
                        line_number: line_idx + 1,
                        line: line.to_string(),
                    });
                }
                None => {
                    tracing::trace!(line_number = line_idx + 1, "Skipping non-speaker line");
                }
            }
        }

        if turns.is_empty() {
            return Err(ScriptError::NoTurns);
        }

        Ok(turns)
    }
}

/// 匹配单行，返回 (speaker_id, 去除首尾空白后的正文)
fn match_line(line: &str) -> Option<(&str, &str)> {
    let caps = SPEAKER_LINE.captures(line)?;
    let speaker_id = caps.get(1)?.as_str();
    let text = caps.get(2).map_or("", |m| m.as_str()).trim();
    Some((speaker_id, text))
}

/// 宽松解析（便捷方法）
///
/// 纯函数，总是成功；没有任何匹配行时返回空序列
pub fn parse_script(script: &str) -> Vec<Turn> {
    ScriptParser::lenient().parse(script).unwrap_or_default()
}
