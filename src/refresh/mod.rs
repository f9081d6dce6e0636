//! Refresh orchestration
//!
//! `RefreshJob` owns the cache store, the registered sources, and the
//! collaborator seams (loader, parser, validator). One `refresh()` call runs
//! the three-stage pipeline for every source; `synchronize()` promotes
//! pending values to the baseline; `summary()` reports per-stage states.

mod download;
mod parsing;
mod validate;

use crate::cache::CacheStore;
use crate::config::JobConfig;
use crate::error::TlResult;
use crate::loader::{DataLoader, FileCacheLoader, HttpDataLoader};
use crate::parser::{JsonListParser, ListParser};
use crate::source::Source;
use crate::summary::{JobSummary, SourceSummary};
use crate::validation::{FingerprintValidator, ListValidator};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default per-source fetch deadline
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-cycle outcome of one stage for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageOutcome {
    /// A new value was computed and stored
    Updated,
    /// The stage ran (or was gated by digests) and the value is unchanged
    Unchanged,
    /// The attempt failed; the error is recorded on the entry
    Failed,
    /// No usable upstream value exists; the stage did not run
    Skipped,
}

/// The trusted list refresh pipeline
///
/// Failures during a refresh never surface to the caller; they are recorded
/// on the affected (source, stage) cache entry and visible in the summary.
pub struct RefreshJob {
    store: CacheStore,
    sources: Vec<Source>,
    loader: Arc<dyn DataLoader>,
    parser: Arc<dyn ListParser>,
    validator: Arc<dyn ListValidator>,
    fetch_timeout: Duration,
}

impl Default for RefreshJob {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshJob {
    /// Create a job with the default collaborator stack
    ///
    /// HTTP loading, JSON parsing, fingerprint validation. Swap any of them
    /// with the setters.
    pub fn new() -> Self {
        Self {
            store: CacheStore::new(),
            sources: vec![],
            loader: Arc::new(HttpDataLoader::new()),
            parser: Arc::new(JsonListParser::new()),
            validator: Arc::new(FingerprintValidator::new()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Create a job from configuration
    ///
    /// Wraps the HTTP loader in an on-disk document cache at the configured
    /// directory and registers the configured sources.
    pub fn from_config(config: JobConfig) -> Self {
        let http = Arc::new(HttpDataLoader::new());
        let loader = Arc::new(FileCacheLoader::new(
            http,
            config.cache_dir(),
            config.cache_expiration(),
        ));

        let mut job = Self::new();
        job.fetch_timeout = config.fetch_timeout();
        job.loader = loader;
        job.sources = config.sources;
        job
    }

    /// Replace the registered source set
    ///
    /// Cache entries of sources no longer registered stay in place until
    /// explicitly evicted.
    pub fn set_sources(&mut self, sources: Vec<Source>) {
        self.sources = sources;
    }

    /// Replace the document loader
    pub fn set_data_loader(&mut self, loader: Arc<dyn DataLoader>) {
        self.loader = loader;
    }

    /// Replace the structural parser
    pub fn set_parser(&mut self, parser: Arc<dyn ListParser>) {
        self.parser = parser;
    }

    /// Replace the signature/compliance validator
    pub fn set_validator(&mut self, validator: Arc<dyn ListValidator>) {
        self.validator = validator;
    }

    /// Set the per-source fetch deadline
    pub fn set_fetch_timeout(&mut self, fetch_timeout: Duration) {
        self.fetch_timeout = fetch_timeout;
    }

    /// The registered sources, in registration order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Run one full pipeline pass over all registered sources
    ///
    /// List-of-lists sources are processed before plain lists so that a
    /// caller resolving eligibility from the LOTL sees its fresh state.
    /// Sources within a group run concurrently, each under its own lock;
    /// the three stages of one source run strictly in order.
    pub async fn refresh(&self) {
        info!("Refreshing {} trusted list sources", self.sources.len());

        let (lotl, tl): (Vec<&Source>, Vec<&Source>) =
            self.sources.iter().partition(|s| s.kind.is_lotl());

        join_all(lotl.into_iter().map(|s| self.refresh_source(s))).await;
        join_all(tl.into_iter().map(|s| self.refresh_source(s))).await;
    }

    async fn refresh_source(&self, source: &Source) {
        let entries = self.store.entries_for(&source.id).await;
        let mut guard = entries.lock().await;
        let entries = &mut *guard;

        let downloaded = download::run(
            &mut entries.download,
            source,
            self.loader.as_ref(),
            self.parser.as_ref(),
            self.fetch_timeout,
        )
        .await;
        if downloaded == StageOutcome::Failed {
            // A download error gates the cycle; downstream entries keep
            // whatever state they already held
            return;
        }

        let parsed = parsing::run(
            &entries.download,
            &mut entries.parsing,
            source,
            self.parser.as_ref(),
        );
        if parsed == StageOutcome::Failed {
            if downloaded == StageOutcome::Updated {
                // The upstream content changed but could not be re-parsed:
                // the published validation result no longer describes it
                debug!("Source {} validation mirrors changed download", source.id);
                entries.validation.mirror_upstream_change();
            }
            return;
        }

        validate::run(
            &entries.parsing,
            &mut entries.validation,
            source,
            self.validator.as_ref(),
        );
    }

    /// Promote all pending stage values to the published baseline
    pub async fn synchronize(&self) {
        debug!("Synchronizing cache baselines");
        self.store.synchronize_all().await;
    }

    /// Snapshot the per-source, per-stage cache states
    ///
    /// A pure read: reports exactly what the last refresh recorded, without
    /// creating or touching entries.
    pub async fn summary(&self) -> JobSummary {
        let mut sources = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let snapshot = match self.store.get(&source.id).await {
                Some(handle) => SourceSummary::from_entries(source, &*handle.lock().await),
                None => SourceSummary::unrefreshed(source),
            };
            sources.push(snapshot);
        }
        JobSummary { sources }
    }

    /// The published baseline parse for a source, if one was synchronized
    ///
    /// This is what trust-anchor construction reads; values landed by a
    /// refresh stay invisible here until [`synchronize`](Self::synchronize).
    pub async fn published_list(&self, source_id: &str) -> Option<Arc<crate::list::ParsedList>> {
        let handle = self.store.get(source_id).await?;
        let entries = handle.lock().await;
        entries.parsing.published().cloned()
    }

    /// The published baseline validation result for a source
    pub async fn published_validation(
        &self,
        source_id: &str,
    ) -> Option<Arc<crate::validation::ValidationResult>> {
        let handle = self.store.get(source_id).await?;
        let entries = handle.lock().await;
        entries.validation.published().cloned()
    }

    /// Remove the cache entries of a source
    ///
    /// The only way entries leave the store; deregistering a source via
    /// `set_sources` does not evict. Returns whether entries existed.
    pub async fn evict_source(&self, source_id: &str) -> bool {
        self.store.evict(source_id).await
    }

    /// Force recomputation of all three stages for a source on the next
    /// refresh, keeping the published baselines observable
    pub async fn invalidate_source(&self, source_id: &str) -> TlResult<()> {
        let handle = self
            .store
            .get(source_id)
            .await
            .ok_or_else(|| crate::error::TlError::UnknownSource(source_id.to_string()))?;
        let mut entries = handle.lock().await;
        entries.download.invalidate();
        entries.parsing.invalidate();
        entries.validation.invalidate();
        Ok(())
    }
}
