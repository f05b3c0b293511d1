use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

use super::{ConversationStore, Row, StoredRecord};
use crate::analysis::AnalysisResult;
use crate::conversation::ConversationInput;
use crate::error::{GossipError, Result};
use crate::retry::RetryPolicy;

const SERVICE: &str = "Supabase";

/// Hosted table accessed through the Supabase REST (PostgREST) interface.
///
/// Loads are retried on transient failures; saves are single attempts so a
/// lost response can never insert the same conversation twice.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    table_url: String,
    retry: RetryPolicy,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: &str, table: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| GossipError::NotConfigured(format!("invalid SUPABASE_ANON_KEY: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| GossipError::NotConfigured(format!("invalid SUPABASE_ANON_KEY: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|source| GossipError::Transport {
                service: SERVICE,
                source,
            })?;

        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{table}", url.trim_end_matches('/')),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "id,created_at,data"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(transport)?;
        let response = check(response).await?;
        let values: Vec<serde_json::Value> = response.json().await.map_err(transport)?;
        Ok(Row::parse_all(values))
    }
}

#[async_trait]
impl ConversationStore for SupabaseStore {
    async fn save(&self, conversation: &ConversationInput, analysis: &AnalysisResult) -> Result<()> {
        let row = Row::new(conversation, analysis)?;
        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        info!(id = %conversation.id, "conversation saved");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredRecord>> {
        let rows = self
            .retry
            .run(GossipError::is_transient, || self.fetch_rows())
            .await?;
        debug!(rows = rows.len(), "conversations loaded");
        Ok(rows.into_iter().filter_map(Row::into_record).collect())
    }
}

fn transport(source: reqwest::Error) -> GossipError {
    GossipError::Transport {
        service: SERVICE,
        source,
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or(body);
    Err(GossipError::Upstream {
        service: SERVICE,
        status: status.as_u16(),
        message,
    })
}
