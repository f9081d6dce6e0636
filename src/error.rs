//! Error types for tlcache
//!
//! All modules use `TlResult<T>` as their return type. Stage failures during
//! a refresh never escape `RefreshJob::refresh()`; they are recorded on the
//! affected cache entry and surface through the summary.

use thiserror::Error;

/// Result type alias for tlcache operations
pub type TlResult<T> = Result<T, TlError>;

/// All errors that can occur in tlcache
#[derive(Error, Debug)]
pub enum TlError {
    // Fetch errors (download stage)
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Empty content returned for {url}")]
    EmptyContent { url: String },

    #[error("Fetch timed out for {url} after {seconds}s")]
    FetchTimeout { url: String, seconds: u64 },

    // Structural errors (document conformity and parsing stage)
    #[error("Not a trust list document: {0}")]
    NotConformant(String),

    #[error("Malformed trust list document: {0}")]
    Structural(String),

    // Validation processing faults (validation stage)
    #[error("Signature evaluation failed: {0}")]
    Processing(String),

    // Source registry errors
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TlError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error for a URL
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the download stage
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::EmptyContent { .. } | Self::FetchTimeout { .. }
        )
    }

    /// Whether the underlying condition may clear on a later refresh
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::FetchTimeout { .. } | Self::EmptyContent { .. }
        )
    }
}
