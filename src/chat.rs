use strum::Display;
use tracing::error;

use crate::analyzer::Analyzer;
use crate::model::LanguageModel;

pub const FALLBACK_REPLY: &str = "Sorry, I could not process your request at the moment. Please try again.";

pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Summarize the key takeaways from this conversation.",
    "What was the main emotion expressed by the other person?",
    "Can you find any subtle subtext or hidden meanings here?",
    "Provide advice based on the dynamics of this chat.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Sender {
    #[strum(to_string = "you")]
    User,
    #[strum(to_string = "ai")]
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Follow-up questions about one conversation.
pub struct ChatSession<'a, M> {
    analyzer: &'a Analyzer<M>,
    conversation_text: String,
    messages: Vec<ChatMessage>,
}

impl<'a, M: LanguageModel> ChatSession<'a, M> {
    pub fn new(analyzer: &'a Analyzer<M>, conversation_text: impl Into<String>) -> Self {
        Self {
            analyzer,
            conversation_text: conversation_text.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Asks one question. Blank input is ignored and returns `None`;
    /// otherwise the AI reply (or the fallback text on failure) is returned.
    pub async fn send(&mut self, question: &str) -> Option<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: question.to_owned(),
        });

        let text = match self.analyzer.chat(&self.conversation_text, question).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "chat request failed");
                FALLBACK_REPLY.to_owned()
            }
        };
        self.messages.push(ChatMessage {
            sender: Sender::Ai,
            text,
        });
        self.messages.last()
    }
}
