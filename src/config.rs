use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{GossipError, Result};
use crate::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Directory name used under the user's data and cache directories.
pub const APP_DIR: &str = env!("CARGO_PKG_NAME");

/// Credentials read from the process environment (and `.env`).
#[derive(Deserialize, Debug, Default, Clone)]
pub struct Environment {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
}

impl Environment {
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        envy::from_env::<Environment>().context("Failed to read environment")
    }

    /// The language-API key, or `None` when unset or blank.
    pub fn language_api_key(&self) -> Option<&str> {
        non_blank(&self.gemini_api_key)
    }

    pub fn model(&self) -> &str {
        non_blank(&self.gemini_model).unwrap_or(DEFAULT_MODEL)
    }

    /// Data-store URL and access key.
    pub fn store_credentials(&self) -> Result<(&str, &str)> {
        let url = non_blank(&self.supabase_url)
            .ok_or_else(|| GossipError::NotConfigured("SUPABASE_URL is not set".into()))?;
        let key = non_blank(&self.supabase_anon_key)
            .ok_or_else(|| GossipError::NotConfigured("SUPABASE_ANON_KEY is not set".into()))?;
        Ok((url, key))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Tunables read from an optional TOML file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub table: String,
    pub request_timeout_secs: u64,
    pub card_width: usize,
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table: "conversations".into(),
            request_timeout_secs: 120,
            card_width: 40,
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;
        toml::from_str(&raw).context("Failed to parse settings TOML")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_dir_matches_the_binary_name() {
        assert_eq!(APP_DIR, "gossip-ai");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let env = Environment {
            gemini_api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(env.language_api_key().is_none());
        assert_eq!(env.model(), DEFAULT_MODEL);
    }

    #[test]
    fn missing_store_credentials_name_the_variable() {
        let env = Environment {
            supabase_url: Some("https://example.supabase.co".into()),
            ..Default::default()
        };
        let err = env.store_credentials().unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            table = "chats"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.table, "chats");
        assert_eq!(settings.card_width, 40);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_backoff_ms, 250);
    }

    #[tokio::test]
    async fn no_settings_file_means_defaults() {
        assert_eq!(Settings::load(None).await.unwrap(), Settings::default());
    }
}
