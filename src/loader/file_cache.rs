//! On-disk document cache wrapping another loader
//!
//! Persists fetched bytes to a cache directory keyed by the URL digest.
//! A cached copy younger than the expiration window is served without
//! touching the inner loader; an expiration of zero always refetches.
//! Inner loader failures propagate as-is: an expired cache never substitutes
//! for a failed fetch, so the download stage observes real outages.

use crate::digest::short_digest;
use crate::error::{TlError, TlResult};
use crate::loader::DataLoader;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Loader persisting documents to disk with a freshness window
pub struct FileCacheLoader {
    inner: Arc<dyn DataLoader>,
    cache_dir: PathBuf,
    expiration: Duration,
}

impl FileCacheLoader {
    /// Wrap a loader with on-disk persistence
    ///
    /// `expiration` of zero disables freshness serving: every fetch goes
    /// through the inner loader, with successful responses still persisted.
    pub fn new(inner: Arc<dyn DataLoader>, cache_dir: impl Into<PathBuf>, expiration: Duration) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            expiration,
        }
    }

    /// Path holding the cached bytes for a URL
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.tl", short_digest(url.as_bytes())))
    }

    async fn read_fresh(&self, path: &Path) -> Option<Vec<u8>> {
        if self.expiration.is_zero() {
            return None;
        }
        let metadata = fs::metadata(path).await.ok()?;
        let modified = metadata.modified().ok()?;
        let age = modified.elapsed().ok()?;
        if age > self.expiration {
            return None;
        }
        fs::read(path).await.ok()
    }

    async fn persist(&self, path: &Path, bytes: &[u8]) -> TlResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TlError::io("creating document cache dir", e))?;
        }
        fs::write(path, bytes)
            .await
            .map_err(|e| TlError::io(format!("writing cached document {}", path.display()), e))
    }
}

#[async_trait]
impl DataLoader for FileCacheLoader {
    async fn fetch(&self, url: &str) -> TlResult<Vec<u8>> {
        let path = self.cache_path(url);

        if let Some(bytes) = self.read_fresh(&path).await {
            debug!("Serving {} from document cache", url);
            return Ok(bytes);
        }

        let bytes = self.inner.fetch(url).await?;
        self.persist(&path, &bytes).await?;
        debug!("Cached {} bytes for {}", bytes.len(), url);
        Ok(bytes)
    }
}
