pub(crate) mod local;
pub(crate) mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::conversation::ConversationInput;
use crate::error::Result;

pub use local::LocalStore;
pub use supabase::SupabaseStore;

/// Append-only storage of analysed conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends one record. Errors propagate to the caller.
    async fn save(&self, conversation: &ConversationInput, analysis: &AnalysisResult) -> Result<()>;

    /// Every stored record, newest first.
    async fn load_all(&self) -> Result<Vec<StoredRecord>>;
}

/// The opaque JSON document kept per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub conversation: ConversationInput,
    #[serde(default)]
    pub analysis: AnalysisResult,
}

/// Row shape shared by every backend: `(id, created_at, data)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: Uuid,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl Row {
    /// Decodes raw rows one by one; a malformed row drops only itself.
    pub fn parse_all(values: Vec<serde_json::Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Row>(value) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(error = %e, "skipping malformed stored row");
                    None
                }
            })
            .collect()
    }

    pub fn new(conversation: &ConversationInput, analysis: &AnalysisResult) -> Result<Self> {
        let document = Document {
            conversation: conversation.clone(),
            analysis: analysis.clone(),
        };
        let data = serde_json::to_value(&document)
            .map_err(|e| crate::error::GossipError::Store(format!("failed to serialise record: {e}")))?;
        Ok(Self {
            id: conversation.id,
            created_at: conversation.created_at,
            data,
        })
    }

    /// Reshapes the row into a flat record, or `None` when the document
    /// does not have the expected shape.
    pub fn into_record(self) -> Option<StoredRecord> {
        match serde_json::from_value::<Document>(self.data) {
            Ok(document) => Some(StoredRecord {
                conversation: document.conversation,
                analysis: document.analysis,
                created_at: self.created_at,
            }),
            Err(e) => {
                warn!(id = %self.id, error = %e, "skipping unreadable stored record");
                None
            }
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp {raw:?}")))
}

/// RFC 3339, or an offset-less Postgres `timestamp` read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// A conversation together with its analysis, as loaded from a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    #[serde(flatten)]
    pub conversation: ConversationInput,
    pub analysis: AnalysisResult,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn id(&self) -> Uuid {
        self.conversation.id
    }
}

/// Result of loading the history, keeping "nothing stored yet" apart from
/// "the store could not be read".
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<StoredRecord>),
    Unavailable(String),
}

impl LoadOutcome {
    pub async fn fetch(store: &dyn ConversationStore) -> Self {
        match store.load_all().await {
            Ok(records) => LoadOutcome::Loaded(records),
            Err(e) => {
                error!(error = %e, "failed to load conversation history");
                LoadOutcome::Unavailable(e.to_string())
            }
        }
    }

    pub fn records(&self) -> &[StoredRecord] {
        match self {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Unavailable(_) => &[],
        }
    }
}
