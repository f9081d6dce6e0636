//! Job configuration
//!
//! TOML-loadable options for assembling a refresh job: fetch deadline,
//! on-disk document cache location and expiration, and source declarations.

use crate::error::{TlError, TlResult};
use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

fn default_fetch_timeout_secs() -> u64 {
    60
}

/// Configuration for a [`RefreshJob`](crate::RefreshJob)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Per-source fetch deadline in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Directory for the on-disk document cache; defaults to the platform
    /// cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Freshness window for cached documents in seconds; 0 always refetches
    #[serde(default)]
    pub cache_expiration_secs: u64,

    /// Sources to register
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            cache_dir: None,
            cache_expiration_secs: 0,
            sources: vec![],
        }
    }
}

impl JobConfig {
    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> TlResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| TlError::io(format!("reading config from {}", path.display()), e))?;

        let config: Self = toml::from_str(&content).map_err(|e| TlError::ConfigInvalid {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Loaded config with {} sources", config.sources.len());
        Ok(config)
    }

    /// The per-source fetch deadline
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The document cache freshness window
    pub fn cache_expiration(&self) -> Duration {
        Duration::from_secs(self.cache_expiration_secs)
    }

    /// The effective document cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(Self::default_cache_dir)
    }

    /// Platform default document cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tlcache")
            .join("documents")
    }
}
