//! 音色解析器
//!
//! (speaker_id, 对话风格) → 音色人设，纯函数且总是成功

use super::{ConversationStyle, SpeakerRole, VoiceName, VoicePersona};

/// 默认第一说话人 ID
pub const DEFAULT_FIRST_SPEAKER: &str = "R";
/// 默认第二说话人 ID
pub const DEFAULT_SECOND_SPEAKER: &str = "S";

const FIRST_ROLE_INSTRUCTIONS: &str = "Personality/affect: A charismatic, high-energy radio host\n\n\
Voice: Enthusiastic and dynamic, motivating and engaging\n\n\
Tone: Playful and expressive, with pitch variation to hold attention\n\n\
Intonation: Stresses key words for emphasis and uses strategic pauses\n\n\
Speed: Moderately fast but clear, speeding up in moments of excitement\n\n\
Emotional range: Openly enthusiastic, funny and sometimes ironic\n\n\
Features: Uses idioms, metaphors and cultural references";

const SECOND_ROLE_INSTRUCTIONS: &str = "Personality/affect: An expert commentator with a touch of irony\n\n\
Voice: Calm and assured, slightly sarcastic\n\n\
Tone: Thoughtful but sharp, with flashes of dry humour\n\n\
Intonation: Subtle inflections to underline contradictions or irony\n\n\
Speed: Moderate pace, slowing down on important points\n\n\
Emotional range: Alternates between apparent seriousness and deadpan humour\n\n\
Features: Elegant turns of phrase and witty remarks";

/// 所有人设共享的收尾指令
const SHARED_DELIVERY_INSTRUCTIONS: &str = "The speakers are funny, sarcastic, cheeky and quick-witted. \
They sound natural and conversational, as if improvising rather than reading a text. \
They may occasionally laugh lightly or react to what the other speaker said. \
The tone is relaxed but smart, with varied intonation to avoid monotony.";

/// 音色解析器
///
/// 第一/第二说话人 ID 可配置，默认 `R` / `S`
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    first_speaker: String,
    second_speaker: String,
}

impl Default for VoiceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_SPEAKER, DEFAULT_SECOND_SPEAKER)
    }
}

impl VoiceResolver {
    pub fn new(first_speaker: impl Into<String>, second_speaker: impl Into<String>) -> Self {
        Self {
            first_speaker: first_speaker.into(),
            second_speaker: second_speaker.into(),
        }
    }

    /// 查询说话人在风格表中的角色；不在表内返回 None
    pub fn role_of(&self, speaker_id: &str) -> Option<SpeakerRole> {
        if speaker_id == self.first_speaker {
            Some(SpeakerRole::First)
        } else if speaker_id == self.second_speaker {
            Some(SpeakerRole::Second)
        } else {
            None
        }
    }

    /// 解析音色人设
    pub fn resolve(&self, speaker_id: &str, style: &ConversationStyle) -> VoicePersona {
        let role = self.role_of(speaker_id);
        let is_first = role == Some(SpeakerRole::First);

        let voice = match (style, role) {
            (ConversationStyle::Default, _) => {
                if is_first {
                    VoiceName::Alloy
                } else {
                    VoiceName::Nova
                }
            }
            (ConversationStyle::Unrecognized(_), _) | (_, None) => fallback_voice(is_first),
            (style, Some(role)) => style_table(style, role).unwrap_or_else(|| fallback_voice(is_first)),
        };

        let role_instructions = if is_first {
            FIRST_ROLE_INSTRUCTIONS
        } else {
            SECOND_ROLE_INSTRUCTIONS
        };

        VoicePersona {
            voice,
            instructions: format!("{}\n\n{}", role_instructions, SHARED_DELIVERY_INSTRUCTIONS),
        }
    }
}

/// 已知风格的双角色音色表
fn style_table(style: &ConversationStyle, role: SpeakerRole) -> Option<VoiceName> {
    use SpeakerRole::{First, Second};

    let voice = match (style, role) {
        (ConversationStyle::MaleMale, First) => VoiceName::Onyx,
        (ConversationStyle::MaleMale, Second) => VoiceName::Echo,
        (ConversationStyle::MaleFemale, First) => VoiceName::Ash,
        (ConversationStyle::MaleFemale, Second) => VoiceName::Shimmer,
        (ConversationStyle::FemaleFemale, First) => VoiceName::Nova,
        (ConversationStyle::FemaleFemale, Second) => VoiceName::Coral,
        _ => return None,
    };
    Some(voice)
}

/// 与风格无关的兜底音色
fn fallback_voice(is_first: bool) -> VoiceName {
    if is_first {
        VoiceName::Onyx
    } else {
        VoiceName::Nova
    }
}

/// 使用默认说话人 ID 解析（便捷方法）
pub fn resolve_voice(speaker_id: &str, style: &ConversationStyle) -> VoicePersona {
    VoiceResolver::default().resolve(speaker_id, style)
}
