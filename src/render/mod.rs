pub(crate) mod cards;
pub(crate) mod overview;

use strum::{Display, EnumString};

use crate::analysis::AnalysisResult;
use cards::*;

pub use overview::overview;

/// Which of the tabbed middle cards is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActiveCard {
    Judge,
    Subtext,
    Timeline,
}

impl ActiveCard {
    /// First tab that has data: judge, then subtext, then timeline.
    pub fn default_for(result: &AnalysisResult) -> Option<Self> {
        if result.ai_judge.is_some() {
            Some(ActiveCard::Judge)
        } else if result.intents_subtext.is_some() {
            Some(ActiveCard::Subtext)
        } else if result.emotion_timeline.is_some() {
            Some(ActiveCard::Timeline)
        } else {
            None
        }
    }
}

/// Full results screen: summary and bars on top, the active tab in the
/// middle, wrap-up material at the bottom. Absent sections are skipped.
pub fn results_view(result: &AnalysisResult, active: Option<ActiveCard>, width: usize) -> String {
    let middle = match active {
        Some(ActiveCard::Judge) => judge_card(result.ai_judge.as_ref(), result.judge_score),
        Some(ActiveCard::Subtext) => subtext_card(result.intents_subtext.as_ref()),
        Some(ActiveCard::Timeline) => timeline_card(result.emotion_timeline.as_ref()),
        None => None,
    };

    let cards = [
        summary_card(result.summary.as_ref()),
        emotion_bars_card(result.emotion_bars.as_ref(), width),
        middle,
        emotion_chart_card(result.emotions.as_deref()),
        subtleties_card(result.subtleties.as_deref()),
        wrap_up_card(result.wrap_up.as_ref()),
        advice_card(result.my_advice.as_deref()),
        audio_card(result.audio_analysis.as_ref()),
    ];

    let rendered: Vec<String> = cards.into_iter().flatten().collect();
    if rendered.is_empty() {
        return "The analysis contained no displayable sections.\n".to_owned();
    }
    rendered.join("\n")
}
