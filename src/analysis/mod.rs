pub(crate) mod decode;
pub(crate) mod extract;
pub(crate) mod prompt;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub use decode::{Decoded, SectionIssue, decode};

/// Structured analysis of one conversation. Every section is optional and
/// rendered only when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_bars: Option<EmotionBarsResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_judge: Option<AiJudgeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents_subtext: Option<IntentsSubtextResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_timeline: Option<EmotionTimelineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_up: Option<WrapUpResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtleties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<Vec<EmotionData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_analysis: Option<AudioAnalysis>,
}

impl AnalysisResult {
    /// True when no section at all was recognised.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryResult {
    pub main_emotion_emoji: String,
    pub summary_text: String,
    pub relationship_tone: String,
}

impl SummaryResult {
    pub fn tone(&self) -> RelationshipTone {
        // `FromStr` falls back to `Other`, so this cannot fail.
        RelationshipTone::from_str(self.relationship_tone.trim())
            .unwrap_or_else(|_| RelationshipTone::Other(self.relationship_tone.clone()))
    }
}

/// Relational dynamic between the speakers, as categorised by the model.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum RelationshipTone {
    #[strum(serialize = "Officially-Business", serialize = "Officially Business")]
    OfficiallyBusiness,
    #[strum(serialize = "Friendly & Casual")]
    FriendlyCasual,
    #[strum(serialize = "Romantic Interest")]
    RomanticInterest,
    #[strum(serialize = "One-Sided Sympathy")]
    OneSidedSympathy,
    #[strum(serialize = "Conflict-Ridden")]
    ConflictRidden,
    #[strum(serialize = "Neutral & Transactional")]
    NeutralTransactional,
    #[strum(default)]
    Other(String),
}

impl RelationshipTone {
    pub fn label(&self) -> &str {
        match self {
            RelationshipTone::OfficiallyBusiness => "Officially-Business",
            RelationshipTone::FriendlyCasual => "Friendly & Casual",
            RelationshipTone::RomanticInterest => "Romantic Interest",
            RelationshipTone::OneSidedSympathy => "One-Sided Sympathy",
            RelationshipTone::ConflictRidden => "Conflict-Ridden",
            RelationshipTone::NeutralTransactional => "Neutral & Transactional",
            RelationshipTone::Other(label) => label,
        }
    }
}

impl fmt::Display for RelationshipTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One emotion split between the two speakers. The two percentages are
/// expected, but not guaranteed, to sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmotionBar {
    pub emotion: String,
    pub emoji: String,
    pub opponent_percentage: f64,
    pub author_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionBarsResult {
    pub bars: Vec<EmotionBar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiJudgeResult {
    pub analysis_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteTranslation {
    pub quote: String,
    pub translation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum SubtextCategory {
    #[strum(to_string = "Flirtatious")]
    Flirt,
    #[strum(to_string = "Jealousy")]
    Jealousy,
    #[strum(to_string = "Passive Aggression")]
    PassiveAggression,
    #[strum(to_string = "Flattery")]
    Flattery,
    #[strum(to_string = "Interest")]
    Interest,
    #[strum(to_string = "Boredom")]
    Boredom,
    #[strum(to_string = "Sarcasm")]
    Sarcasm,
    #[strum(to_string = "General Subtext")]
    GeneralSubtext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentsSubtextResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flirt: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jealousy: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive_aggression: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flattery: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boredom: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sarcasm: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_subtext: Option<Vec<QuoteTranslation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_conversation_insight: Option<QuoteTranslation>,
}

impl IntentsSubtextResult {
    pub fn list(&self, category: SubtextCategory) -> &[QuoteTranslation] {
        let list = match category {
            SubtextCategory::Flirt => &self.flirt,
            SubtextCategory::Jealousy => &self.jealousy,
            SubtextCategory::PassiveAggression => &self.passive_aggression,
            SubtextCategory::Flattery => &self.flattery,
            SubtextCategory::Interest => &self.interest,
            SubtextCategory::Boredom => &self.boredom,
            SubtextCategory::Sarcasm => &self.sarcasm,
            SubtextCategory::GeneralSubtext => &self.general_subtext,
        };
        list.as_deref().unwrap_or_default()
    }

    /// Non-empty categories in display order.
    pub fn categories(&self) -> impl Iterator<Item = (SubtextCategory, &[QuoteTranslation])> {
        SubtextCategory::iter()
            .map(|category| (category, self.list(category)))
            .filter(|(_, items)| !items.is_empty())
    }

    pub fn has_categories(&self) -> bool {
        self.categories().next().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionTimelinePhase {
    pub phase: String,
    pub description: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionTimelineResult {
    pub phases: Vec<EmotionTimelinePhase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrapUpResult {
    pub psychologist_summary: String,
    pub advice: String,
}

/// A single intensity sample for one speaker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionData {
    pub timestamp: f64,
    pub speaker: String,
    pub emotion: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioAnalysis {
    pub transcribed_text: String,
    pub tone_analysis: String,
    pub emotion_analysis: String,
    pub brief_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tones_parse_case_insensitively() {
        let summary = SummaryResult {
            relationship_tone: "romantic interest".into(),
            ..Default::default()
        };
        assert_eq!(summary.tone(), RelationshipTone::RomanticInterest);
        assert_eq!(summary.tone().to_string(), "Romantic Interest");
    }

    #[test]
    fn unknown_tone_is_kept_verbatim() {
        let summary = SummaryResult {
            relationship_tone: "Frenemies".into(),
            ..Default::default()
        };
        assert_eq!(summary.tone(), RelationshipTone::Other("Frenemies".into()));
        assert_eq!(summary.tone().label(), "Frenemies");
    }

    #[test]
    fn categories_skip_missing_and_empty_lists() {
        let subtext = IntentsSubtextResult {
            flirt: Some(vec![QuoteTranslation {
                quote: "Nice eyes".into(),
                translation: "Interested".into(),
            }]),
            passive_aggression: Some(vec![]),
            ..Default::default()
        };
        let found: Vec<_> = subtext.categories().map(|(c, _)| c).collect();
        assert_eq!(found, vec![SubtextCategory::Flirt]);
        assert!(!IntentsSubtextResult::default().has_categories());
    }

    #[test]
    fn empty_sections_are_not_serialised() {
        let json = serde_json::to_value(AnalysisResult {
            my_advice: Some("Listen more.".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "myAdvice": "Listen more." }));
    }
}
