//! Download stage
//!
//! Fetches the raw document under the per-source deadline, probes that it is
//! a trust list document at all, and applies digest change detection. A
//! failure here gates the whole cycle for the source: parsing and validation
//! are left untouched.

use crate::cache::CacheEntry;
use crate::digest::sha256_hex;
use crate::error::TlError;
use crate::loader::DataLoader;
use crate::parser::ListParser;
use crate::refresh::StageOutcome;
use crate::source::Source;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

pub(crate) async fn run(
    entry: &mut CacheEntry<Vec<u8>>,
    source: &Source,
    loader: &dyn DataLoader,
    parser: &dyn ListParser,
    fetch_timeout: Duration,
) -> StageOutcome {
    let fetched = match timeout(fetch_timeout, loader.fetch(&source.url)).await {
        Ok(result) => result,
        Err(_) => Err(TlError::FetchTimeout {
            url: source.url.clone(),
            seconds: fetch_timeout.as_secs(),
        }),
    };

    let bytes = match fetched {
        Ok(bytes) if bytes.is_empty() => {
            let err = TlError::EmptyContent {
                url: source.url.clone(),
            };
            warn!("Download failed for source {}: {}", source.id, err);
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Download failed for source {}: {}", source.id, err);
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
    };

    if let Err(err) = parser.check_conformity(&bytes) {
        warn!("Downloaded content for source {} rejected: {}", source.id, err);
        entry.record_error(&err);
        return StageOutcome::Failed;
    }

    let digest = sha256_hex(&bytes);
    let changed = entry.record_value(bytes, digest.clone(), digest);
    if changed {
        debug!("Source {} downloaded new content", source.id);
        StageOutcome::Updated
    } else {
        debug!("Source {} content unchanged", source.id);
        StageOutcome::Unchanged
    }
}
