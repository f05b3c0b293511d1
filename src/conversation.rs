use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use uuid::Uuid;

use crate::error::{GossipError, Result};

pub const EMPTY_SUBMISSION: &str = "Please provide conversation content (text, image, or audio).";

const PREVIEW_CHARS: usize = 100;

/// Inline media, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub mime_type: String,
    pub data: String,
}

impl Media {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    pub async fn from_file(path: &Path, fallback_mime: &str) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime = guess_mime(path).unwrap_or(fallback_mime);
        Ok(Self::from_bytes(mime, &bytes))
    }

    /// Decoded bytes; empty when the payload is not valid base64.
    pub fn bytes(&self) -> Vec<u8> {
        BASE64_STANDARD.decode(&self.data).unwrap_or_default()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Accepts `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        Some(Self {
            mime_type: mime_type.to_owned(),
            data: data.to_owned(),
        })
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp3" => "audio/mp3",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        _ => return None,
    })
}

fn serialize_media<S: Serializer>(media: &Option<Media>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match media {
        Some(media) => serializer.serialize_some(&media.to_data_url()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_media<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Media>, D::Error> {
    let url = Option::<String>::deserialize(deserializer)?;
    Ok(url.as_deref().and_then(Media::from_data_url))
}

/// A submitted conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInput {
    pub id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(
        rename = "imageUrl",
        default,
        serialize_with = "serialize_media",
        deserialize_with = "deserialize_media"
    )]
    pub image: Option<Media>,
    #[serde(
        rename = "audioUrl",
        default,
        serialize_with = "serialize_media",
        deserialize_with = "deserialize_media"
    )]
    pub audio: Option<Media>,
    pub created_at: DateTime<Utc>,
}

impl ConversationInput {
    /// One-line description for history listings.
    pub fn preview(&self) -> String {
        if self.image.is_some() {
            return "Image-based conversation".into();
        }
        if self.audio.is_some() {
            return "Audio-based conversation".into();
        }
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub text: String,
    pub context: String,
    pub image: Option<Media>,
    pub audio: Option<Media>,
}

impl Submission {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() && self.image.is_none() && self.audio.is_none() {
            return Err(GossipError::Validation(EMPTY_SUBMISSION.into()));
        }
        Ok(())
    }

    /// Builds the immutable record. `text` replaces the typed text, e.g. with
    /// an audio transcript.
    pub fn into_conversation(self, text: Option<String>) -> ConversationInput {
        let context = self.context.trim();
        ConversationInput {
            id: Uuid::new_v4(),
            text: text.unwrap_or_else(|| self.text.trim().to_owned()),
            context: (!context.is_empty()).then(|| context.to_owned()),
            image: self.image,
            audio: self.audio,
            created_at: Utc::now(),
        }
    }
}
