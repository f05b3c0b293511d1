use thiserror::Error;

/// Why a model reply could not be turned into a JSON object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("reply contained no JSON")]
    NoJson,

    #[error("reply JSON is malformed: {reason}")]
    Malformed { reason: String },

    #[error("reply JSON is not an object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum GossipError {
    /// A required credential or setting is absent.
    #[error("{0}")]
    NotConfigured(String),

    /// Input rejected before any external call was made.
    #[error("{0}")]
    Validation(String),

    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("model returned no text")]
    EmptyReply,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GossipError {
    /// Transport failures and throttling/5xx replies may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            GossipError::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            GossipError::Upstream { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GossipError>;
