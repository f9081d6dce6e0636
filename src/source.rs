//! Trusted list source registration
//!
//! A source pairs a list URL with the certificates expected to have signed
//! it. Sources are immutable once registered for a refresh cycle; changing
//! the registered set only takes effect on the next `set_sources` call.

use crate::digest::sha256_hex;
use crate::error::{TlError, TlResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of trusted list published at a source URL
///
/// A plain trusted list (TL) enumerates trust services directly. A list of
/// trusted lists (LOTL) references other TLs and may carry pivot URLs,
/// historical signed snapshots of its own definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceKind {
    Tl,
    Lotl {
        #[serde(default)]
        pivot_urls: Vec<String>,
    },
}

impl SourceKind {
    /// Whether this source is a list of trusted lists
    pub fn is_lotl(&self) -> bool {
        matches!(self, Self::Lotl { .. })
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tl => write!(f, "tl"),
            Self::Lotl { .. } => write!(f, "lotl"),
        }
    }
}

/// An expected signer certificate, held as opaque DER bytes
///
/// The pipeline never interprets the certificate contents itself; it hands
/// them to the validator collaborator and exposes a SHA-256 fingerprint for
/// matching. Serializes as a base64 string so certificates read naturally
/// in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignerCertificate {
    der: Vec<u8>,
}

impl TryFrom<String> for SignerCertificate {
    type Error = TlError;

    fn try_from(encoded: String) -> TlResult<Self> {
        Self::from_base64(&encoded)
    }
}

impl From<SignerCertificate> for String {
    fn from(cert: SignerCertificate) -> Self {
        base64::engine::general_purpose::STANDARD.encode(cert.der)
    }
}

impl SignerCertificate {
    /// Wrap raw DER bytes
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    /// Decode a base64-encoded DER certificate
    pub fn from_base64(encoded: &str) -> TlResult<Self> {
        let der = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| TlError::InvalidCertificate(e.to_string()))?;
        if der.is_empty() {
            return Err(TlError::InvalidCertificate("empty certificate".to_string()));
        }
        Ok(Self { der })
    }

    /// Raw DER bytes
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER encoding, lowercase hex
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.der)
    }
}

/// A registered trusted list source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Stable identifier keying this source's cache entries
    pub id: String,

    /// URL the list is published at
    pub url: String,

    /// TL or LOTL, with kind-specific fields
    #[serde(flatten)]
    pub kind: SourceKind,

    /// Certificates expected to have signed the list
    #[serde(default)]
    pub expected_signers: Vec<SignerCertificate>,
}

impl Source {
    /// Register a plain trusted list source with a generated id
    pub fn trusted_list(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            kind: SourceKind::Tl,
            expected_signers: vec![],
        }
    }

    /// Register a list-of-trusted-lists source with a generated id
    pub fn list_of_lists(url: impl Into<String>, pivot_urls: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            kind: SourceKind::Lotl { pivot_urls },
            expected_signers: vec![],
        }
    }

    /// Override the generated id with a caller-chosen one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the certificates expected to have signed this list
    pub fn with_expected_signers(mut self, signers: Vec<SignerCertificate>) -> Self {
        self.expected_signers = signers;
        self
    }
}
