//! Structural trust list parsing
//!
//! Two levels of scrutiny with different failure owners: a cheap conformity
//! probe answers "is this a trust list document at all" and gates the
//! download stage, while the full parse decodes and schema-checks the body
//! for the parsing stage.

use crate::digest::sha256_hex;
use crate::error::{TlError, TlResult};
use crate::list::{ListPointer, ParsedList, ServiceEntry, SignatureBlock};
use crate::source::SourceKind;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Document format version this parser understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Abstract structural parser interface
pub trait ListParser: Send + Sync {
    /// Cheap probe: is this recognizably a trust list document?
    ///
    /// Rejecting here fails the download stage; the content is treated like
    /// an unusable response rather than a decodable-but-invalid list.
    fn check_conformity(&self, bytes: &[u8]) -> TlResult<()>;

    /// Decode a conformant document into a [`ParsedList`]
    ///
    /// Enforces baseline schema compliance: required fields, supported
    /// format version, and the pointer section for list-of-lists sources.
    fn parse(&self, bytes: &[u8], kind: &SourceKind) -> TlResult<ParsedList>;
}

#[derive(Deserialize)]
struct Envelope {
    trust_list: serde_json::Value,
    #[serde(default)]
    signature: Option<SignatureBlock>,
}

#[derive(Deserialize)]
struct ListBody {
    version: u32,
    sequence_number: u64,
    issue_date: DateTime<Utc>,
    #[serde(default)]
    next_update: Option<DateTime<Utc>>,
    services: Vec<ServiceEntry>,
    #[serde(default)]
    pointers: Option<Vec<ListPointer>>,
}

/// Parser for the JSON trust list envelope format
///
/// Documents look like `{ "trust_list": { ... }, "signature": { ... } }`.
/// The canonical body serialization (sorted keys) is digested at parse time
/// so signature checking downstream never re-reads the raw bytes.
#[derive(Debug, Default, Clone)]
pub struct JsonListParser;

impl JsonListParser {
    pub fn new() -> Self {
        Self
    }
}

impl ListParser for JsonListParser {
    fn check_conformity(&self, bytes: &[u8]) -> TlResult<()> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|_| TlError::NotConformant("not a structured document".to_string()))?;
        match value.get("trust_list") {
            Some(body) if body.is_object() => Ok(()),
            Some(_) => Err(TlError::NotConformant(
                "trust list body is not an object".to_string(),
            )),
            None => Err(TlError::NotConformant(
                "missing trust list body".to_string(),
            )),
        }
    }

    fn parse(&self, bytes: &[u8], kind: &SourceKind) -> TlResult<ParsedList> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| TlError::Structural(format!("undecodable envelope: {}", e)))?;

        // Canonical digest of the body as published, before schema checks
        let payload_digest = sha256_hex(&serde_json::to_vec(&envelope.trust_list)?);

        let body: ListBody = serde_json::from_value(envelope.trust_list)
            .map_err(|e| TlError::Structural(format!("invalid trust list body: {}", e)))?;

        if body.version != SUPPORTED_FORMAT_VERSION {
            return Err(TlError::Structural(format!(
                "unsupported format version {}",
                body.version
            )));
        }

        let pointers = match (kind, body.pointers) {
            (SourceKind::Lotl { .. }, Some(pointers)) if !pointers.is_empty() => pointers,
            (SourceKind::Lotl { .. }, _) => {
                return Err(TlError::Structural(
                    "list of lists without pointer section".to_string(),
                ))
            }
            (SourceKind::Tl, pointers) => pointers.unwrap_or_default(),
        };

        Ok(ParsedList {
            sequence_number: body.sequence_number,
            issue_date: body.issue_date,
            next_update: body.next_update,
            services: body.services,
            pointers,
            signature: envelope.signature,
            payload_digest,
        })
    }
}
