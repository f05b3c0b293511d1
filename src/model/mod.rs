pub(crate) mod gemini;

use async_trait::async_trait;

use crate::conversation::Media;
use crate::error::Result;

pub use gemini::GeminiClient;

/// One piece of a multi-part model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Inline(Media),
}

/// A generative-language backend: takes request parts, returns reply text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, parts: Vec<Part>) -> Result<String>;
}
