use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LanguageModel, Part};
use crate::error::{GossipError, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const SERVICE: &str = "Gemini API";

/// REST client for the Gemini `generateContent` endpoint. Every call is a
/// single attempt.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GossipError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: parts.into_iter().map(WirePart::from).collect(),
            }],
        };
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, parts = request.contents[0].parts.len(), "sending generateContent request");

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|source| GossipError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GossipError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|source| GossipError::Transport {
                service: SERVICE,
                source,
            })?;
        let text = reply_text(parsed).ok_or(GossipError::EmptyReply)?;
        debug!(chars = text.len(), "generateContent reply received");
        Ok(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text },
            Part::Inline(media) => WirePart::InlineData {
                inline_data: InlineData {
                    mime_type: media.mime_type,
                    data: media.data,
                },
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Text of the first candidate, all text parts joined.
fn reply_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates?.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper.error.message.unwrap_or_else(|| body.to_owned());
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            }
        }
        Err(_) => body.to_owned(),
    }
}
