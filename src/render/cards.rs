//! One function per analysis section. Each returns `None` when the section
//! is absent, so callers can skip it without special cases.

use itertools::Itertools;
use std::fmt::Write;

use crate::analysis::{
    AiJudgeResult, AudioAnalysis, EmotionBar, EmotionBarsResult, EmotionData, EmotionTimelineResult,
    IntentsSubtextResult, QuoteTranslation, SummaryResult, WrapUpResult,
};

const OPPONENT_CELL: char = '█';
const AUTHOR_CELL: char = '░';
const INTENSITY_CELLS: usize = 10;

pub const NO_SUBTEXT: &str = "No specific intents or subtext detected.";

fn card(title: &str, body: &str) -> String {
    format!("── {title} ──\n{}\n", body.trim_end())
}

/// Splits `width` cells between the two speakers in proportion to their
/// percentages. Negative or non-finite values count as zero; when the two
/// values do not sum to 100 they are normalised by their sum.
pub fn bar_segments(opponent: f64, author: f64, width: usize) -> (usize, usize) {
    let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    let (opponent, author) = (clean(opponent), clean(author));
    let total = opponent + author;
    if total <= 0.0 {
        return (0, 0);
    }
    let opponent_cells = ((opponent / total) * width as f64).round() as usize;
    let opponent_cells = opponent_cells.min(width);
    (opponent_cells, width - opponent_cells)
}

fn percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}%")
    } else {
        format!("{value:.1}%")
    }
}

pub fn summary_card(summary: Option<&SummaryResult>) -> Option<String> {
    let summary = summary?;
    let body = format!(
        "{}  {}\nRelationship tone: {}",
        summary.main_emotion_emoji,
        summary.summary_text,
        summary.tone()
    );
    Some(card("Summary", &body))
}

fn emotion_bar(bar: &EmotionBar, width: usize) -> String {
    let (opponent, author) = bar_segments(bar.opponent_percentage, bar.author_percentage, width);
    let left = format!("Opponent {}", percent(bar.opponent_percentage));
    let right = format!("Author {}", percent(bar.author_percentage));
    let gap = (width + 2).saturating_sub(left.chars().count() + right.chars().count()).max(1);
    format!(
        "{} {}\n[{}{}]\n{left}{}{right}",
        bar.emoji,
        bar.emotion,
        OPPONENT_CELL.to_string().repeat(opponent),
        AUTHOR_CELL.to_string().repeat(author),
        " ".repeat(gap),
    )
}

pub fn emotion_bars_card(bars: Option<&EmotionBarsResult>, width: usize) -> Option<String> {
    let bars = bars?;
    let body = if bars.bars.is_empty() {
        "No emotions detected.".to_owned()
    } else {
        bars.bars.iter().map(|bar| emotion_bar(bar, width)).join("\n\n")
    };
    Some(card("Emotion Bars", &body))
}

pub fn judge_card(judge: Option<&AiJudgeResult>, score: Option<f64>) -> Option<String> {
    let judge = judge?;
    let mut body = judge.analysis_text.clone();
    if let Some(score) = score {
        let _ = write!(body, "\n\nJudge score: {score}");
    }
    Some(card("⚖️ AI Judge", &body))
}

fn quote_pair(out: &mut String, pair: &QuoteTranslation) {
    let _ = writeln!(out, "  • \"{}\"", pair.quote);
    let _ = writeln!(out, "    → {}", pair.translation);
}

pub fn subtext_card(subtext: Option<&IntentsSubtextResult>) -> Option<String> {
    let subtext = subtext?;
    let mut body = String::new();
    if let Some(insight) = &subtext.key_conversation_insight {
        let _ = writeln!(body, "Key insight: \"{}\"", insight.quote);
        let _ = writeln!(body, "  Interpretation: {}\n", insight.translation);
    }
    if subtext.has_categories() {
        for (category, items) in subtext.categories() {
            let _ = writeln!(body, "{category}:");
            items.iter().for_each(|pair| quote_pair(&mut body, pair));
        }
    } else {
        body.push_str(NO_SUBTEXT);
    }
    Some(card("🤔 Intents & Subtext", &body))
}

pub fn timeline_card(timeline: Option<&EmotionTimelineResult>) -> Option<String> {
    let timeline = timeline?;
    let body = timeline
        .phases
        .iter()
        .enumerate()
        .map(|(i, phase)| format!("{}. {} {}\n   {}", i + 1, phase.emoji, phase.phase, phase.description))
        .join("\n");
    Some(card("📈 Emotion Timeline", &body))
}

pub fn wrap_up_card(wrap_up: Option<&WrapUpResult>) -> Option<String> {
    let wrap_up = wrap_up?;
    let body = format!("{}\n\nAdvice: {}", wrap_up.psychologist_summary, wrap_up.advice);
    Some(card("Wrap-Up", &body))
}

pub fn advice_card(advice: Option<&str>) -> Option<String> {
    Some(card("My Advice", advice?))
}

pub fn audio_card(audio: Option<&AudioAnalysis>) -> Option<String> {
    let audio = audio?;
    let body = format!(
        "Transcription: {}\nTone: {}\nEmotions: {}\nSummary: {}",
        audio.transcribed_text, audio.tone_analysis, audio.emotion_analysis, audio.brief_summary
    );
    Some(card("🎙️ Audio Analysis", &body))
}

pub fn subtleties_card(subtleties: Option<&[String]>) -> Option<String> {
    let subtleties = subtleties.filter(|s| !s.is_empty())?;
    let body = subtleties.iter().map(|s| format!("• {s}")).join("\n");
    Some(card("Subtleties", &body))
}

/// Intensity samples grouped by speaker, in order of first appearance.
pub fn emotion_chart_card(emotions: Option<&[EmotionData]>) -> Option<String> {
    let emotions = emotions.filter(|e| !e.is_empty())?;
    let mut body = String::new();
    for speaker in emotions.iter().map(|e| e.speaker.as_str()).unique() {
        let _ = writeln!(body, "{speaker}");
        for sample in emotions.iter().filter(|e| e.speaker == speaker) {
            let intensity = if sample.intensity.is_finite() { sample.intensity.clamp(0.0, 1.0) } else { 0.0 };
            let cells = (intensity * INTENSITY_CELLS as f64).round() as usize;
            let _ = writeln!(
                body,
                "  {:>5}s  {:<12} {:<width$} {:.1}",
                sample.timestamp,
                sample.emotion,
                "▇".repeat(cells),
                intensity,
                width = INTENSITY_CELLS,
            );
        }
    }
    Some(card("Emotion Chart", &body))
}
