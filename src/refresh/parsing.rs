//! Parsing stage
//!
//! Decodes the current download value into a structured list. Recomputes
//! when the download digest differs from the one that produced the
//! currently held parse, or when the last attempt failed. A structural
//! failure is confined here; the previous good parse stays available
//! downstream.

use crate::cache::CacheEntry;
use crate::list::ParsedList;
use crate::parser::ListParser;
use crate::refresh::StageOutcome;
use crate::source::Source;
use tracing::{debug, warn};

pub(crate) fn run(
    download: &CacheEntry<Vec<u8>>,
    entry: &mut CacheEntry<ParsedList>,
    source: &Source,
    parser: &dyn ListParser,
) -> StageOutcome {
    let (Some(bytes), Some(input_digest)) = (download.current(), download.value_digest()) else {
        return StageOutcome::Skipped;
    };

    if !entry.needs_recompute(input_digest) {
        debug!("Source {} parse input unchanged", source.id);
        return StageOutcome::Unchanged;
    }

    let list = match parser.parse(bytes, &source.kind) {
        Ok(list) => list,
        Err(err) => {
            warn!("Parsing failed for source {}: {}", source.id, err);
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
    };

    let value_digest = match list.digest() {
        Ok(digest) => digest,
        Err(err) => {
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
    };

    let changed = entry.record_value(list, input_digest.to_string(), value_digest);
    if changed {
        debug!("Source {} parsed to a new list", source.id);
        StageOutcome::Updated
    } else {
        StageOutcome::Unchanged
    }
}
