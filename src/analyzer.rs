use tracing::{debug, info};

use crate::analysis::decode::decode_object;
use crate::analysis::extract::strip_reply;
use crate::analysis::prompt::{audio_parts, chat_prompt, conversation_parts};
use crate::analysis::{AudioAnalysis, Decoded, decode};
use crate::cache::TranscriptCache;
use crate::conversation::{ConversationInput, Media};
use crate::error::Result;
use crate::model::{LanguageModel, Part};

/// Turns conversations into analyses by prompting a [`LanguageModel`].
///
/// Calls are independent and stateless; nothing is retried.
pub struct Analyzer<M> {
    model: M,
    transcripts: Option<TranscriptCache>,
}

impl<M: LanguageModel> Analyzer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            transcripts: None,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Reuse earlier audio analyses for identical recordings.
    pub fn with_transcript_cache(mut self, cache: TranscriptCache) -> Self {
        self.transcripts = Some(cache);
        self
    }

    pub async fn analyze_conversation(&self, conversation: &ConversationInput) -> Result<Decoded> {
        let parts = conversation_parts(conversation);
        debug!(id = %conversation.id, chars = conversation.text.len(), "requesting analysis");
        let reply = self.model.generate(parts).await?;
        let decoded = decode(&reply)?;
        info!(id = %conversation.id, dropped = decoded.issues.len(), "analysis received");
        Ok(decoded)
    }

    pub async fn analyze_audio(&self, audio: &Media) -> Result<AudioAnalysis> {
        if let Some(cache) = &self.transcripts {
            if let Some(cached) = cache.get(audio).await {
                info!("using cached transcription");
                return Ok(cached);
            }
        }

        debug!(mime = %audio.mime_type, "requesting transcription");
        let reply = self.model.generate(audio_parts(audio)).await?;
        let analysis: AudioAnalysis = decode_object(&reply)?;

        if let Some(cache) = &self.transcripts {
            cache.insert(audio, &analysis).await;
        }
        Ok(analysis)
    }

    /// Free-text answer to a follow-up question about a conversation.
    pub async fn chat(&self, conversation_text: &str, question: &str) -> Result<String> {
        let prompt = chat_prompt(conversation_text, question);
        let reply = self.model.generate(vec![Part::Text(prompt)]).await?;
        Ok(strip_reply(&reply).to_owned())
    }
}
