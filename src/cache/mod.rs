//! Per-source, per-stage result caching
//!
//! Every registered source owns three cache entries, one per pipeline stage
//! (download, parsing, validation). Each entry tracks a freshly computed
//! value and the published baseline separately, so a refresh can land new
//! data without consumers observing it until synchronization.
//!
//! # Entry states
//!
//! | State | Meaning |
//! |-------|---------|
//! | RefreshNeeded | no successful value yet, or explicitly invalidated |
//! | Error | last attempt failed; previous good value retained |
//! | Desynchronized | new value computed, not yet the baseline |
//! | Synchronized | baseline is current and unchanged |

pub mod entry;
pub mod state;
pub mod store;

pub use entry::{CacheEntry, ErrorRecord};
pub use state::CacheState;
pub use store::{CacheStore, SourceEntries};
