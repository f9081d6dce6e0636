//! Cache entry state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one (source, stage) cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// No successful value has been produced, or the entry was invalidated
    RefreshNeeded,
    /// The most recent attempt failed; any previous good value is retained
    Error,
    /// A new value exists that is not yet the published baseline
    Desynchronized,
    /// The published baseline is current and unchanged
    Synchronized,
}

impl CacheState {
    /// Whether the stage must recompute regardless of input digests
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::RefreshNeeded)
    }

    /// Whether the entry holds a usable current value for downstream stages
    ///
    /// An `Error` entry may still hold a previous good value; usability is
    /// decided by the entry, this only covers the state component.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Desynchronized | Self::Synchronized)
    }

    /// Whether a pending value is awaiting promotion to the baseline
    pub fn is_desynchronized(&self) -> bool {
        matches!(self, Self::Desynchronized)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshNeeded => write!(f, "refresh_needed"),
            Self::Error => write!(f, "error"),
            Self::Desynchronized => write!(f, "desynchronized"),
            Self::Synchronized => write!(f, "synchronized"),
        }
    }
}
