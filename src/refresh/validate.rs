//! Validation stage
//!
//! Evaluates signature and compliance of the current parsed list. A bad
//! signature or a compliance finding lands inside the result value and goes
//! through normal change detection; only a fault that prevents evaluation
//! at all becomes a stage error.

use crate::cache::CacheEntry;
use crate::list::ParsedList;
use crate::refresh::StageOutcome;
use crate::source::Source;
use crate::validation::{ListValidator, ValidationResult};
use tracing::{debug, warn};

pub(crate) fn run(
    parsing: &CacheEntry<ParsedList>,
    entry: &mut CacheEntry<ValidationResult>,
    source: &Source,
    validator: &dyn ListValidator,
) -> StageOutcome {
    let (Some(list), Some(input_digest)) = (parsing.current(), parsing.value_digest()) else {
        return StageOutcome::Skipped;
    };

    if !entry.needs_recompute(input_digest) {
        debug!("Source {} validation input unchanged", source.id);
        return StageOutcome::Unchanged;
    }

    let result = match validator.validate(list, &source.expected_signers) {
        Ok(result) => result,
        Err(err) => {
            warn!("Validation fault for source {}: {}", source.id, err);
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
    };

    let value_digest = match result.digest() {
        Ok(digest) => digest,
        Err(err) => {
            entry.record_error(&err);
            return StageOutcome::Failed;
        }
    };

    if !result.signature_intact {
        debug!(
            "Source {} signature not intact: {}",
            source.id,
            result.diagnostics.join("; ")
        );
    }

    let changed = entry.record_value(result, input_digest.to_string(), value_digest);
    if changed {
        StageOutcome::Updated
    } else {
        StageOutcome::Unchanged
    }
}
