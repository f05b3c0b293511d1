use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::AnalysisResult;
use super::extract::extract_json_payload;
use crate::error::DecodeError;

/// A section that was present in the reply but had the wrong shape and
/// was therefore dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionIssue {
    pub section: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub result: AnalysisResult,
    pub issues: Vec<SectionIssue>,
}

/// Parses a model reply into an [`AnalysisResult`], section by section.
///
/// The reply must hold a JSON object (optionally inside a markdown fence).
/// Each known section is decoded on its own; malformed sections are dropped
/// and reported in [`Decoded::issues`] rather than failing the whole reply.
/// Unknown keys are ignored.
pub fn decode(reply: &str) -> Result<Decoded, DecodeError> {
    let mut object = parse_object(reply)?;
    let mut issues = Vec::new();
    let mut take = SectionReader {
        object: &mut object,
        issues: &mut issues,
    };

    let result = AnalysisResult {
        summary: take.section("summary"),
        emotion_bars: take.section("emotionBars"),
        ai_judge: take.section("aiJudge"),
        intents_subtext: take.section("intentsSubtext"),
        emotion_timeline: take.section("emotionTimeline"),
        wrap_up: take.section("wrapUp"),
        my_advice: take.section("myAdvice"),
        judge_score: take.section("judgeScore"),
        subtleties: take.section("subtleties"),
        emotions: take.section("emotions"),
        audio_analysis: take.section("audioAnalysis"),
    };

    for issue in &issues {
        warn!(section = issue.section, reason = %issue.reason, "dropping malformed analysis section");
    }

    Ok(Decoded { result, issues })
}

/// Parses a reply that must be a single JSON object of type `T`.
pub fn decode_object<T: DeserializeOwned>(reply: &str) -> Result<T, DecodeError> {
    let object = parse_object(reply)?;
    serde_json::from_value(Value::Object(object)).map_err(|e| DecodeError::Malformed {
        reason: e.to_string(),
    })
}

fn parse_object(reply: &str) -> Result<Map<String, Value>, DecodeError> {
    let payload = extract_json_payload(reply);
    if !payload.contains(['{', '[']) {
        return Err(DecodeError::NoJson);
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(DecodeError::NotAnObject),
        Err(e) => Err(DecodeError::Malformed {
            reason: e.to_string(),
        }),
    }
}

struct SectionReader<'a> {
    object: &'a mut Map<String, Value>,
    issues: &'a mut Vec<SectionIssue>,
}

impl SectionReader<'_> {
    fn section<T: DeserializeOwned>(&mut self, key: &'static str) -> Option<T> {
        match self.object.remove(key)? {
            Value::Null => None,
            value => match serde_json::from_value(value) {
                Ok(section) => Some(section),
                Err(e) => {
                    self.issues.push(SectionIssue {
                        section: key,
                        reason: e.to_string(),
                    });
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AudioAnalysis;

    const FULL: &str = r#"{
        "summary": {"mainEmotionEmoji": "😊", "summaryText": "Warm.", "relationshipTone": "Friendly & Casual"},
        "emotionBars": {"bars": [{"emotion": "Trust", "emoji": "🤝", "opponentPercentage": 80, "authorPercentage": 20}]},
        "aiJudge": {"analysisText": "Both listened."},
        "myAdvice": "Keep it up."
    }"#;

    #[test]
    fn fenced_and_bare_replies_decode_identically() {
        let bare = decode(FULL).unwrap();
        let tagged = decode(&format!("```json\n{FULL}\n```")).unwrap();
        let untagged = decode(&format!("```\n{FULL}\n```")).unwrap();
        assert_eq!(bare, tagged);
        assert_eq!(bare, untagged);
        assert!(bare.issues.is_empty());
        assert_eq!(bare.result.emotion_bars.unwrap().bars[0].opponent_percentage, 80.0);
    }

    #[test]
    fn prose_reply_is_reported_not_panicked() {
        let err = decode("I'm sorry, I can't analyse this conversation.").unwrap_err();
        assert_eq!(err, DecodeError::NoJson);
    }

    #[test]
    fn broken_json_is_malformed() {
        let err = decode("```json\n{\"summary\": \n```").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn arrays_are_not_analyses() {
        assert_eq!(decode("[1, 2]").unwrap_err(), DecodeError::NotAnObject);
    }

    #[test]
    fn wrong_shaped_section_is_dropped_and_reported() {
        let decoded = decode(
            r#"{"summary": "just a string", "emotionBars": {"bars": "nope"}, "myAdvice": "Call them."}"#,
        )
        .unwrap();
        assert!(decoded.result.summary.is_none());
        assert!(decoded.result.emotion_bars.is_none());
        assert_eq!(decoded.result.my_advice.as_deref(), Some("Call them."));
        let sections: Vec<_> = decoded.issues.iter().map(|i| i.section).collect();
        assert_eq!(sections, vec!["summary", "emotionBars"]);
    }

    #[test]
    fn unknown_keys_yield_an_empty_result() {
        let decoded = decode(r#"{"verdict": "fine", "null_section": null, "aiJudge": null}"#).unwrap();
        assert!(decoded.result.is_empty());
        assert!(decoded.issues.is_empty());
    }

    #[test]
    fn missing_fields_inside_a_section_default() {
        let decoded = decode(r#"{"wrapUp": {"advice": "Rest."}}"#).unwrap();
        let wrap_up = decoded.result.wrap_up.unwrap();
        assert_eq!(wrap_up.advice, "Rest.");
        assert_eq!(wrap_up.psychologist_summary, "");
    }

    #[test]
    fn audio_object_decodes() {
        let audio: AudioAnalysis = decode_object(
            "```json\n{\"transcribedText\": \"hi\", \"toneAnalysis\": \"calm\", \"emotionAnalysis\": \"joy\", \"briefSummary\": \"greeting\"}\n```",
        )
        .unwrap();
        assert_eq!(audio.transcribed_text, "hi");
        assert_eq!(audio.brief_summary, "greeting");
    }
}
