//! Cache entry bookkeeping
//!
//! A `CacheEntry<T>` holds the latest good value a stage produced alongside
//! the published baseline consumers read, plus the digests driving change
//! detection. A failed attempt never discards a previously held good value.

use crate::cache::state::CacheState;
use crate::error::TlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error details recorded on a failed stage attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Human-readable failure description
    pub message: String,

    /// When the failure was recorded
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    /// Capture an error at the current time
    pub fn capture(err: &TlError) -> Self {
        Self {
            message: err.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// One (source, stage) cache slot
///
/// `current` is the latest successfully computed value; `published` is the
/// baseline consumers observe. They diverge between a refresh that lands a
/// new value and the synchronization that promotes it.
#[derive(Debug)]
pub struct CacheEntry<T> {
    state: CacheState,
    current: Option<Arc<T>>,
    published: Option<Arc<T>>,
    /// Digest of the upstream input that produced `current`
    input_digest: Option<String>,
    /// Digest of `current` itself
    value_digest: Option<String>,
    /// Digest of `published`
    published_digest: Option<String>,
    error: Option<ErrorRecord>,
    last_attempt: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheEntry<T> {
    /// Create an empty entry awaiting its first refresh
    pub fn new() -> Self {
        Self {
            state: CacheState::RefreshNeeded,
            current: None,
            published: None,
            input_digest: None,
            value_digest: None,
            published_digest: None,
            error: None,
            last_attempt: None,
            last_success: None,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Latest good value, retained across later failed attempts
    pub fn current(&self) -> Option<&Arc<T>> {
        self.current.as_ref()
    }

    /// The baseline value consumers observe
    pub fn published(&self) -> Option<&Arc<T>> {
        self.published.as_ref()
    }

    /// Digest of the upstream input that produced the current value
    pub fn input_digest(&self) -> Option<&str> {
        self.input_digest.as_deref()
    }

    /// Digest of the current value
    pub fn value_digest(&self) -> Option<&str> {
        self.value_digest.as_deref()
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    pub fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.last_attempt
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Whether the stage must recompute its value for the given upstream
    /// input
    ///
    /// True when no value exists, when the entry is in `Error` or
    /// `RefreshNeeded`, or when the upstream digest differs from the one
    /// that produced the current value. An upstream reverting to
    /// previously-good content recomputes and clears a recorded error
    /// rather than being skipped over it.
    pub fn needs_recompute(&self, upstream_digest: &str) -> bool {
        self.current.is_none()
            || !self.state.is_usable()
            || self.input_digest.as_deref() != Some(upstream_digest)
    }

    /// Record a failed attempt
    ///
    /// The state moves to `Error`; value, digests, and baseline stay as they
    /// were.
    pub fn record_error(&mut self, err: &TlError) {
        self.state = CacheState::Error;
        self.error = Some(ErrorRecord::capture(err));
        self.last_attempt = Some(Utc::now());
    }

    /// Record a successful computation
    ///
    /// The resulting state derives from the baseline: `Synchronized` when
    /// the new value digest matches the published digest, `Desynchronized`
    /// otherwise. Returns whether the held value actually changed.
    pub fn record_value(&mut self, value: T, input_digest: String, value_digest: String) -> bool {
        let now = Utc::now();
        self.last_attempt = Some(now);
        self.last_success = Some(now);
        self.error = None;

        let changed = self.value_digest.as_deref() != Some(value_digest.as_str());
        if changed {
            self.current = Some(Arc::new(value));
        }
        self.input_digest = Some(input_digest);
        self.value_digest = Some(value_digest);
        self.state = if self.value_digest == self.published_digest {
            CacheState::Synchronized
        } else {
            CacheState::Desynchronized
        };
        changed
    }

    /// Mark the entry stale because its upstream content changed while this
    /// stage could not be recomputed
    ///
    /// The value is untouched; only the state flips to `Desynchronized`.
    pub fn mirror_upstream_change(&mut self) {
        self.state = CacheState::Desynchronized;
    }

    /// Promote the current value to the published baseline
    ///
    /// Only acts on `Desynchronized` entries. An entry with no value cannot
    /// publish a baseline and falls back to `RefreshNeeded`.
    pub fn synchronize(&mut self) {
        if !self.state.is_desynchronized() {
            return;
        }
        if self.current.is_none() {
            self.state = CacheState::RefreshNeeded;
            return;
        }
        self.published = self.current.clone();
        self.published_digest = self.value_digest.clone();
        self.state = CacheState::Synchronized;
    }

    /// Explicitly invalidate the entry, forcing recomputation on the next
    /// refresh
    ///
    /// The published baseline stays observable until a new value replaces
    /// it.
    pub fn invalidate(&mut self) {
        self.state = CacheState::RefreshNeeded;
        self.current = None;
        self.input_digest = None;
        self.value_digest = None;
        self.error = None;
    }
}
