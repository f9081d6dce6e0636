//! Document loading abstraction
//!
//! Provides a trait for fetching raw list bytes that can be implemented by
//! different backends (plain HTTP, a persistent on-disk cache wrapping
//! another loader, an in-memory map for offline refreshes and tests).

pub mod file_cache;
pub mod http;
pub mod memory;

pub use file_cache::FileCacheLoader;
pub use http::HttpDataLoader;
pub use memory::MemoryDataLoader;

use crate::error::TlResult;
use async_trait::async_trait;

/// Abstract document loader interface
///
/// Implementations own transport concerns (persistence, expiration, retry);
/// the refresh pipeline only sees bytes or a failure. Returning an empty
/// byte vector is treated as a failure by the download stage.
#[async_trait]
pub trait DataLoader: Send + Sync {
    /// Fetch the raw bytes published at a URL
    async fn fetch(&self, url: &str) -> TlResult<Vec<u8>>;
}
