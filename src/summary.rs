//! Read-only pipeline state snapshots
//!
//! The summary reports exactly the states and errors the stages recorded in
//! the cache store; nothing is recomputed or inferred. It carries no
//! timestamps: repeating a refresh against unchanged upstream conditions
//! yields an identical summary, failed fetches included.

use crate::cache::{CacheEntry, CacheState, SourceEntries};
use crate::source::{Source, SourceKind};
use serde::Serialize;

/// Snapshot of one stage entry
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    /// Cache state as recorded by the stage
    pub state: CacheState,

    /// Message of the recorded error, if the last attempt failed
    pub error: Option<String>,
}

impl StageSummary {
    fn from_entry<T>(entry: &CacheEntry<T>) -> Self {
        Self {
            state: entry.state(),
            error: entry.error().map(|e| e.message.clone()),
        }
    }

    fn unrefreshed() -> Self {
        Self {
            state: CacheState::RefreshNeeded,
            error: None,
        }
    }
}

/// Snapshot of all three stages of one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub url: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    pub download: StageSummary,
    pub parsing: StageSummary,
    pub validation: StageSummary,
}

impl SourceSummary {
    /// Snapshot the entries of a registered source
    pub(crate) fn from_entries(source: &Source, entries: &SourceEntries) -> Self {
        Self {
            id: source.id.clone(),
            url: source.url.clone(),
            kind: source.kind.clone(),
            download: StageSummary::from_entry(&entries.download),
            parsing: StageSummary::from_entry(&entries.parsing),
            validation: StageSummary::from_entry(&entries.validation),
        }
    }

    /// Snapshot for a source that has never been refreshed
    pub(crate) fn unrefreshed(source: &Source) -> Self {
        Self {
            id: source.id.clone(),
            url: source.url.clone(),
            kind: source.kind.clone(),
            download: StageSummary::unrefreshed(),
            parsing: StageSummary::unrefreshed(),
            validation: StageSummary::unrefreshed(),
        }
    }

    /// The three stage states in pipeline order
    pub fn states(&self) -> (CacheState, CacheState, CacheState) {
        (
            self.download.state,
            self.parsing.state,
            self.validation.state,
        )
    }
}

/// Snapshot of the whole job, one entry per registered source
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub sources: Vec<SourceSummary>,
}

impl JobSummary {
    /// Look up a source snapshot by id
    pub fn source(&self, id: &str) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| s.id == id)
    }
}
