use std::fmt::Write;

use crate::store::LoadOutcome;

const RECENT: usize = 5;
const INSIGHTS_PER_CONVERSATION: usize = 5;

/// Dashboard text: totals, the most recent conversations, or a notice when
/// the history is empty or could not be read.
pub fn overview(outcome: &LoadOutcome) -> String {
    let mut out = String::from("Welcome to GossipAI\n\n");

    let records = match outcome {
        LoadOutcome::Unavailable(reason) => {
            let _ = writeln!(out, "History is unavailable right now: {reason}");
            out.push_str("Run `gossip-ai analyze` to submit a new conversation.\n");
            return out;
        }
        LoadOutcome::Loaded(records) => records,
    };

    let _ = writeln!(out, "Total Conversations: {}", records.len());
    let _ = writeln!(out, "Insights Generated:  {}\n", records.len() * INSIGHTS_PER_CONVERSATION);

    if records.is_empty() {
        out.push_str("No conversations yet. Analyze your first one with `gossip-ai analyze`.\n");
        return out;
    }

    out.push_str("Recent Conversations\n");
    for record in records.iter().take(RECENT) {
        let created = record.conversation.created_at.format("%Y-%m-%d at %H:%M:%S");
        let _ = writeln!(out, "  {}  {created}", record.id());
        let _ = writeln!(out, "    {}", record.conversation.preview().replace('\n', " "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::conversation::Submission;
    use crate::store::StoredRecord;

    fn record(text: &str) -> StoredRecord {
        let conversation = Submission {
            text: text.into(),
            ..Default::default()
        }
        .into_conversation(None);
        StoredRecord {
            created_at: conversation.created_at,
            conversation,
            analysis: AnalysisResult::default(),
        }
    }

    #[test]
    fn empty_history_invites_first_analysis() {
        let text = overview(&LoadOutcome::Loaded(vec![]));
        assert!(text.contains("Total Conversations: 0"));
        assert!(text.contains("No conversations yet"));
    }

    #[test]
    fn unavailable_history_is_not_shown_as_empty() {
        let text = overview(&LoadOutcome::Unavailable("connection refused".into()));
        assert!(text.contains("unavailable"));
        assert!(text.contains("connection refused"));
        assert!(!text.contains("No conversations yet"));
    }

    #[test]
    fn lists_five_most_recent_with_totals() {
        let records: Vec<_> = (0..7).map(|i| record(&format!("conversation {i}"))).collect();
        let text = overview(&LoadOutcome::Loaded(records));
        assert!(text.contains("Total Conversations: 7"));
        assert!(text.contains("Insights Generated:  35"));
        assert!(text.contains("conversation 0"));
        assert!(text.contains("conversation 4"));
        assert!(!text.contains("conversation 5"));
    }
}
