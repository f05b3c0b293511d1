use crate::conversation::ConversationInput;
use crate::model::Part;

const ANALYSIS_PROMPT: &str = r#"
You are GossipAI, an expert conversation analyst and perceptive AI psychologist. Dissect the conversation above (typed text, a screenshot of a chat, or a transcribed recording) and answer with ONE valid JSON object shaped exactly like the example at the end. Do not write anything outside that JSON object: no markdown, no commentary.

Produce these sections:

1. "summary": a readable summary of at most 3-4 sentences ("summaryText"); the single emoji that best captures the dominant emotion of the OPPONENT, not the author ("mainEmotionEmoji"); and the relationship tone ("relationshipTone"), chosen from: "Officially-Business", "Friendly & Casual", "Romantic Interest", "One-Sided Sympathy", "Conflict-Ridden", "Neutral & Transactional".

2. "emotionBars": 3 to 5 distinct, relevant emotions (think beyond the basics: Trust, Relaxation, Distrust, Engagement, Frustration, Empathy, Sarcasm Detection). Give each an emoji and split it between the two participants as "opponentPercentage" and "authorPercentage", which MUST sum to 100 for that emotion.

3. "aiJudge": as an impartial judge, weigh the key messages and turning points of each participant and write a semi-formal narrative ("analysisText") on communication strengths and weaknesses, with a few emojis for emphasis.

4. "intentsSubtext": hidden intentions and subtext. Use the lists "flirt", "jealousy", "passiveAggression", "flattery", "interest", "boredom", "sarcasm" and "generalSubtext". Each entry quotes the exact suspicious fragment ("quote") and states what it really means ("translation"). Optionally highlight the single most telling pair as "keyConversationInsight".

5. "emotionTimeline": exactly three phases named "Beginning", "Middle" and "End". For each, describe the shifting atmosphere and dominant emotions ("description") and pick an emoji.

6. "wrapUp": a light, friendly, insightful summary of at most 3 sentences from a seasoned psychologist ("psychologistSummary") and one concrete piece of advice tailored to this conversation ("advice"), no self-help cliches.

7. "myAdvice": one direct, practical, supportive piece of advice for the author.

Example of the required structure:
{
  "summary": {
    "mainEmotionEmoji": "😊",
    "summaryText": "The conversation started cautiously but became a warm, supportive exchange.",
    "relationshipTone": "Romantic Interest"
  },
  "emotionBars": {
    "bars": [
      { "emotion": "Trust", "emoji": "🤝", "opponentPercentage": 80, "authorPercentage": 20 },
      { "emotion": "Engagement", "emoji": "💡", "opponentPercentage": 70, "authorPercentage": 30 },
      { "emotion": "Conflict Avoidance", "emoji": "🕊️", "opponentPercentage": 40, "authorPercentage": 60 }
    ]
  },
  "aiJudge": {
    "analysisText": "The opponent handled a sensitive topic with real emotional intelligence. 👍 The author hesitated at first but turned the tension into rapport. ✨"
  },
  "intentsSubtext": {
    "flirt": [{ "quote": "Your eyes sparkle when you talk about it.", "translation": "Romantic interest wrapped in a compliment." }],
    "passiveAggression": [],
    "sarcasm": [{ "quote": "Oh, that's incredibly helpful.", "translation": "The opposite is meant: annoyance." }],
    "generalSubtext": [{ "quote": "I'm fine.", "translation": "Unspoken frustration, a wish to drop the topic." }]
  },
  "emotionTimeline": {
    "phases": [
      { "phase": "Beginning", "description": "Formal, guarded openings with an undercurrent of uncertainty.", "emoji": "😬" },
      { "phase": "Middle", "description": "Shared humour breaks the ice and opens up personal topics.", "emoji": "😄" },
      { "phase": "End", "description": "Mutual understanding and a hint of future plans.", "emoji": "🥰" }
    ]
  },
  "wrapUp": {
    "psychologistSummary": "Empathy turned early awkwardness into genuine connection.",
    "advice": "Open with something light next time to set the tone early."
  },
  "myAdvice": "Practise active listening so both of you feel heard."
}
"#;

const AUDIO_PROMPT: &str = r#"
Analyse the attached audio:
1. Transcribe the speech to text.
2. Describe the overall tone of the speech.
3. Name the key emotions present.
4. Summarise the content briefly.

Answer with ONLY a JSON object with the keys "transcribedText", "toneAnalysis", "emotionAnalysis" and "briefSummary", for example:
{
  "transcribedText": "Hello, how are you today?",
  "toneAnalysis": "Friendly and positive",
  "emotionAnalysis": "Joy, calmness",
  "briefSummary": "A short greeting expressing well-being."
}
"#;

/// Request parts for a full analysis: the conversation, its context, an
/// optional screenshot and finally the instructions.
pub fn conversation_parts(conversation: &ConversationInput) -> Vec<Part> {
    let mut parts = vec![Part::Text(format!(
        "Analyze the following conversation based on the user's input:\nConversation Content: {}",
        conversation.text
    ))];
    if let Some(context) = &conversation.context {
        parts.push(Part::Text(format!("\nConversation Context: {context}")));
    }
    if let Some(image) = &conversation.image {
        parts.push(Part::Inline(image.clone()));
    }
    parts.push(Part::Text(ANALYSIS_PROMPT.to_owned()));
    parts
}

pub fn audio_parts(audio: &crate::conversation::Media) -> Vec<Part> {
    vec![
        Part::Inline(audio.clone()),
        Part::Text(AUDIO_PROMPT.to_owned()),
    ]
}

pub fn chat_prompt(conversation_text: &str, question: &str) -> String {
    format!(
        r#"Based on the following conversation:
"{conversation_text}"

User's question/statement: "{question}"

As an AI conversation assistant, answer the user's question or statement helpfully and concisely, staying strictly within the context of the conversation above. If the question is unrelated to the conversation, politely say that you can only answer questions about it."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Media, Submission};

    #[test]
    fn parts_follow_content_context_image_instructions_order() {
        let conversation = Submission {
            text: "A: hi\nB: hey".into(),
            context: "first date".into(),
            image: Some(Media::from_bytes("image/jpeg", b"jpg")),
            ..Default::default()
        }
        .into_conversation(None);

        let parts = conversation_parts(&conversation);
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], Part::Text(t) if t.ends_with("Conversation Content: A: hi\nB: hey")));
        assert!(matches!(&parts[1], Part::Text(t) if t.contains("first date")));
        assert!(matches!(&parts[2], Part::Inline(m) if m.mime_type == "image/jpeg"));
        assert!(matches!(&parts[3], Part::Text(t) if t.contains("\"emotionTimeline\"")));
    }

    #[test]
    fn text_only_conversation_has_two_parts() {
        let conversation = Submission {
            text: "hello".into(),
            ..Default::default()
        }
        .into_conversation(None);
        assert_eq!(conversation_parts(&conversation).len(), 2);
    }

    #[test]
    fn chat_prompt_embeds_both_inputs() {
        let prompt = chat_prompt("A: bye", "Was A upset?");
        assert!(prompt.contains("\"A: bye\""));
        assert!(prompt.contains("\"Was A upset?\""));
    }
}
