//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 语音合成服务支持的音色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceName {
    /// 中性、均衡
    Alloy,
    /// 年轻、有活力的男声
    Ash,
    /// 富有表现力
    Ballad,
    /// 柔和的女声
    Coral,
    /// 低沉、有共鸣的男声
    Echo,
    /// 温暖的叙述声
    Fable,
    /// 清晰、专业的女声
    Nova,
    /// 低沉、权威的男声
    Onyx,
    /// 成熟、沉稳的女声
    Sage,
    /// 轻快、明亮的女声
    Shimmer,
}

impl VoiceName {
    pub const ALL: [VoiceName; 10] = [
        VoiceName::Alloy,
        VoiceName::Ash,
        VoiceName::Ballad,
        VoiceName::Coral,
        VoiceName::Echo,
        VoiceName::Fable,
        VoiceName::Nova,
        VoiceName::Onyx,
        VoiceName::Sage,
        VoiceName::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceName::Alloy => "alloy",
            VoiceName::Ash => "ash",
            VoiceName::Ballad => "ballad",
            VoiceName::Coral => "coral",
            VoiceName::Echo => "echo",
            VoiceName::Fable => "fable",
            VoiceName::Nova => "nova",
            VoiceName::Onyx => "onyx",
            VoiceName::Sage => "sage",
            VoiceName::Shimmer => "shimmer",
        }
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对话风格 - 决定两个角色的音色搭配
///
/// 无法识别的名称保留原文，解析时回退到与风格无关的默认表
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationStyle {
    /// 未指定
    #[default]
    Default,
    /// 两个男声
    MaleMale,
    /// 一男一女
    MaleFemale,
    /// 两个女声
    FemaleFemale,
    /// 未知风格
    Unrecognized(String),
}

impl ConversationStyle {
    /// 从请求参数解析，总是成功
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Default;
        };

        match name.to_lowercase().replace('_', "-").as_str() {
            "default" => Self::Default,
            "male-male" | "homme-homme" => Self::MaleMale,
            "male-female" | "mixed" | "homme-femme" => Self::MaleFemale,
            "female-female" | "femme-femme" => Self::FemaleFemale,
            _ => Self::Unrecognized(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::MaleMale => "male-male",
            Self::MaleFemale => "male-female",
            Self::FemaleFemale => "female-female",
            Self::Unrecognized(name) => name,
        }
    }
}

impl std::fmt::Display for ConversationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 说话人角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    /// 第一说话人：热情、有活力
    First,
    /// 第二说话人：沉稳、带点讽刺
    Second,
}

/// 音色人设：音色 + 表达风格指令
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoicePersona {
    pub voice: VoiceName,
    pub instructions: String,
}
