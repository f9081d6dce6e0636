//! HTTP document loader
//!
//! Fetches list bytes over HTTPS with a blocking `ureq` agent, run on the
//! blocking pool so the async refresh loop is never stalled by a slow
//! server. The agent carries its own global timeout; the download stage
//! additionally enforces the per-source deadline.

use crate::error::{TlError, TlResult};
use crate::loader::DataLoader;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default whole-request timeout for the underlying agent
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Loader fetching documents over HTTP(S)
#[derive(Clone)]
pub struct HttpDataLoader {
    agent: ureq::Agent,
}

impl HttpDataLoader {
    /// Create a loader with the default request timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a loader with a custom whole-request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpDataLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataLoader for HttpDataLoader {
    async fn fetch(&self, url: &str) -> TlResult<Vec<u8>> {
        let agent = self.agent.clone();
        let request_url = url.to_string();

        let bytes = tokio::task::spawn_blocking(move || -> TlResult<Vec<u8>> {
            let mut response = agent
                .get(&request_url)
                .call()
                .map_err(|e| TlError::fetch(&request_url, e.to_string()))?;
            response
                .body_mut()
                .read_to_vec()
                .map_err(|e| TlError::fetch(&request_url, e.to_string()))
        })
        .await
        .map_err(|e| TlError::fetch(url, format!("fetch task failed: {}", e)))??;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}
