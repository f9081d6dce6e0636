//! Map-backed document loader
//!
//! Serves documents from a fixed in-memory map. Used for offline refreshes
//! from preloaded content and as the loader of choice in tests.

use crate::error::{TlError, TlResult};
use crate::loader::DataLoader;
use async_trait::async_trait;
use std::collections::HashMap;

/// Loader returning preloaded documents by URL
#[derive(Debug, Default, Clone)]
pub struct MemoryDataLoader {
    documents: HashMap<String, Vec<u8>>,
}

impl MemoryDataLoader {
    /// Create an empty loader; every fetch fails until documents are added
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a URL to document bytes
    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.documents.insert(url.into(), bytes);
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_document(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// Drop the document mapped to a URL
    pub fn remove(&mut self, url: &str) {
        self.documents.remove(url);
    }
}

#[async_trait]
impl DataLoader for MemoryDataLoader {
    async fn fetch(&self, url: &str) -> TlResult<Vec<u8>> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| TlError::fetch(url, "no document available"))
    }
}
