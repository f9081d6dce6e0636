//! Content digesting for change detection
//!
//! All cache change detection compares SHA-256 digests. Same bytes = same
//! digest = no state transition.

use sha2::{Digest, Sha256};

/// Hash bytes with SHA-256, returning the full lowercase hex digest
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Short digest prefix used for filesystem keys (first 16 hex chars)
pub fn short_digest(data: &[u8]) -> String {
    let mut digest = sha256_hex(data);
    digest.truncate(16);
    digest
}
