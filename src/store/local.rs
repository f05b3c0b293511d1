use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;

use super::{ConversationStore, Row, StoredRecord};
use crate::analysis::AnalysisResult;
use crate::config::APP_DIR;
use crate::conversation::ConversationInput;
use crate::error::{GossipError, Result};

/// History kept in a single JSON file on this machine.
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/gossip-ai/conversations.json`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = dirs::data_dir().context("Failed to determine data directory")?;
        Ok(base.join(APP_DIR).join("conversations.json"))
    }

    async fn read_rows(&self) -> Result<Vec<Row>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let values: Vec<serde_json::Value> = serde_json::from_slice(&raw)
            .map_err(|e| GossipError::Store(format!("{} is corrupt: {e}", self.path.display())))?;
        Ok(Row::parse_all(values))
    }

    async fn write_rows(&self, rows: &[Row]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_vec_pretty(rows)
            .map_err(|e| GossipError::Store(format!("failed to serialise history: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for LocalStore {
    async fn save(&self, conversation: &ConversationInput, analysis: &AnalysisResult) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_rows().await?;
        rows.push(Row::new(conversation, analysis)?);
        self.write_rows(&rows).await?;
        info!(id = %conversation.id, path = %self.path.display(), "conversation saved");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredRecord>> {
        let mut rows = self.read_rows().await?;
        // Later inserts win ties on equal timestamps.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().filter_map(Row::into_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Submission;

    fn conversation(text: &str) -> ConversationInput {
        Submission {
            text: text.into(),
            ..Default::default()
        }
        .into_conversation(None)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("none.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_save_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested/history.json"));

        let first = conversation("first");
        let mut second = conversation("second");
        second.created_at = first.created_at;

        store.save(&first, &AnalysisResult::default()).await.unwrap();
        store.save(&second, &AnalysisResult::default()).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), second.id);
        assert_eq!(records[1].id(), first.id);
    }

    #[tokio::test]
    async fn older_timestamp_sorts_last_regardless_of_insert_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));

        let newer = conversation("newer");
        let mut older = conversation("older");
        older.created_at = newer.created_at - chrono::Duration::hours(1);

        store.save(&newer, &AnalysisResult::default()).await.unwrap();
        store.save(&older, &AnalysisResult::default()).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records[0].id(), newer.id);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let err = LocalStore::new(&path).load_all().await.unwrap_err();
        assert!(matches!(err, GossipError::Store(_)));
    }
}
