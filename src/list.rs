//! Structured trust list representation
//!
//! The decoded form a raw document is parsed into. Change detection between
//! refresh cycles compares canonical digests of this structure, so field
//! order must stay stable: serde serialization of these structs is the
//! canonical form.

use crate::digest::sha256_hex;
use crate::error::TlResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single trust service entry in a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Trust service provider name
    pub provider: String,

    /// Service type identifier (e.g. a qualified CA URI)
    pub service_type: String,

    /// Current status identifier
    pub status: String,

    /// Base64-encoded DER certificates acting as trust anchors
    #[serde(default)]
    pub certificates: Vec<String>,
}

/// Pointer from a list of trusted lists to a child list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPointer {
    /// URL of the referenced list
    pub url: String,

    /// Territory code of the referenced list, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
}

/// Signature block embedded in a trust list document
///
/// The signature is detached from the list body: `payload_digest` is the
/// SHA-256 the signer computed over the canonical body serialization, and
/// `signer_certificate` carries the signing certificate as base64 DER.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Base64-encoded DER certificate of the signer
    pub signer_certificate: String,

    /// Hex SHA-256 digest of the canonical list body the signature covers
    pub payload_digest: String,
}

/// A fully parsed trusted list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedList {
    /// Monotonically increasing list sequence number
    pub sequence_number: u64,

    /// When this list issue was published
    pub issue_date: DateTime<Utc>,

    /// When the next issue is due, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_update: Option<DateTime<Utc>>,

    /// Trust service entries, in document order
    pub services: Vec<ServiceEntry>,

    /// Pointers to child lists (populated for LOTL sources only)
    #[serde(default)]
    pub pointers: Vec<ListPointer>,

    /// Signature block found in the document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,

    /// Hex SHA-256 of the canonical list body, fixed at parse time
    pub payload_digest: String,
}

impl ParsedList {
    /// Canonical digest of the whole parsed structure
    ///
    /// Used for change detection between refresh cycles: two parses of
    /// byte-different documents that decode to the same structure produce
    /// the same digest and cause no state transition downstream.
    pub fn digest(&self) -> TlResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_hex(&canonical))
    }
}
