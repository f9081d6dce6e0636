//! Cache store keyed by source id
//!
//! Owns the per-source entry triples behind per-source-id locks. A refresh
//! cycle and the synchronizer both take the source lock, so stage writes,
//! baseline promotion, and summary reads never interleave within one source.

use crate::cache::entry::CacheEntry;
use crate::list::ParsedList;
use crate::validation::ValidationResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// The three stage entries belonging to one source
#[derive(Debug, Default)]
pub struct SourceEntries {
    /// Raw downloaded document bytes
    pub download: CacheEntry<Vec<u8>>,
    /// Structured representation decoded from the download
    pub parsing: CacheEntry<ParsedList>,
    /// Signature and compliance evaluation of the parsed list
    pub validation: CacheEntry<ValidationResult>,
}

impl SourceEntries {
    /// Promote every pending stage value to the published baseline
    pub fn synchronize(&mut self) {
        self.download.synchronize();
        self.parsing.synchronize();
        self.validation.synchronize();
    }
}

/// Registry of cache entries for all sources ever referenced
///
/// Entries are created on first reference and only removed by explicit
/// eviction; dropping a source from the registered set leaves its entries
/// in place.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, Arc<Mutex<SourceEntries>>>>,
}

impl CacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry triple for a source id, creating it on first reference
    pub async fn entries_for(&self, source_id: &str) -> Arc<Mutex<SourceEntries>> {
        let mut map = self.entries.lock().await;
        map.entry(source_id.to_string())
            .or_insert_with(|| {
                debug!("Creating cache entries for source {}", source_id);
                Arc::new(Mutex::new(SourceEntries::default()))
            })
            .clone()
    }

    /// Get the entry triple for a source id without creating it
    pub async fn get(&self, source_id: &str) -> Option<Arc<Mutex<SourceEntries>>> {
        self.entries.lock().await.get(source_id).cloned()
    }

    /// All source ids with live entries
    pub async fn source_ids(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    /// Promote all pending values across all sources
    ///
    /// Each source is promoted under its own lock, so readers observe either
    /// the pre- or post-synchronization entry, never a torn mix.
    pub async fn synchronize_all(&self) {
        let handles: Vec<_> = {
            let map = self.entries.lock().await;
            map.values().cloned().collect()
        };
        for handle in handles {
            handle.lock().await.synchronize();
        }
    }

    /// Remove the entries of a source, returning whether any existed
    pub async fn evict(&self, source_id: &str) -> bool {
        let removed = self.entries.lock().await.remove(source_id).is_some();
        if removed {
            debug!("Evicted cache entries for source {}", source_id);
        }
        removed
    }
}
