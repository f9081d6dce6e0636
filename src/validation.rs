//! Signature and compliance evaluation
//!
//! A validator turns a parsed list into a [`ValidationResult`] value. A bad
//! signature or a compliance finding is data, not a failure: the stage only
//! errors when evaluation itself cannot run.

use crate::digest::sha256_hex;
use crate::error::{TlError, TlResult};
use crate::list::ParsedList;
use crate::source::SignerCertificate;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating a parsed list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the document carried a signature block at all
    pub signature_found: bool,

    /// Whether the signature checked out against the expected signers
    pub signature_intact: bool,

    /// Whether the list content passed all compliance rules
    pub compliant: bool,

    /// Human-readable findings explaining any false flag above
    pub diagnostics: Vec<String>,
}

impl ValidationResult {
    /// Whether the list can be trusted as-is
    pub fn is_trusted(&self) -> bool {
        self.signature_found && self.signature_intact && self.compliant
    }

    /// Canonical digest for change detection
    pub fn digest(&self) -> TlResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_hex(&canonical))
    }
}

/// Abstract signature/compliance validator interface
///
/// Implementations that perform real public-key verification plug in here;
/// an `Err` return means evaluation could not run at all and becomes a
/// stage error, never a negative result.
pub trait ListValidator: Send + Sync {
    /// Evaluate signature and compliance of a parsed list
    fn validate(
        &self,
        list: &ParsedList,
        expected_signers: &[SignerCertificate],
    ) -> TlResult<ValidationResult>;
}

/// Digest- and fingerprint-based validator
///
/// Checks that the signature block's payload digest matches the canonical
/// body digest fixed at parse time, and that the declared signer certificate
/// is one of the source's expected signers (by SHA-256 fingerprint). It does
/// not verify public-key signatures; swap in a [`ListValidator`] backed by a
/// real crypto stack for that.
#[derive(Debug, Default, Clone)]
pub struct FingerprintValidator;

impl FingerprintValidator {
    pub fn new() -> Self {
        Self
    }

    fn compliance_findings(list: &ParsedList) -> Vec<String> {
        let mut findings = Vec::new();

        match list.next_update {
            None => findings.push("next update date missing".to_string()),
            Some(next_update) if next_update <= list.issue_date => {
                findings.push("next update not after issue date".to_string())
            }
            Some(_) => {}
        }

        if list.services.is_empty() {
            findings.push("list declares no trust services".to_string());
        }
        for service in &list.services {
            if service.certificates.is_empty() {
                findings.push(format!("service without certificates: {}", service.provider));
            }
        }

        findings
    }
}

impl ListValidator for FingerprintValidator {
    fn validate(
        &self,
        list: &ParsedList,
        expected_signers: &[SignerCertificate],
    ) -> TlResult<ValidationResult> {
        let mut diagnostics = Vec::new();

        let (signature_found, signature_intact) = match &list.signature {
            None => {
                diagnostics.push("no signature block present".to_string());
                (false, false)
            }
            Some(signature) => {
                let signer = SignerCertificate::from_base64(&signature.signer_certificate)
                    .map_err(|e| TlError::Processing(format!("signer certificate: {}", e)))?;

                let digest_matches = signature.payload_digest == list.payload_digest;
                if !digest_matches {
                    diagnostics.push("signature digest does not cover list body".to_string());
                }

                let signer_known = expected_signers
                    .iter()
                    .any(|expected| expected.fingerprint() == signer.fingerprint());
                if !signer_known {
                    diagnostics.push(if expected_signers.is_empty() {
                        "no expected signers configured".to_string()
                    } else {
                        "signer not among expected certificates".to_string()
                    });
                }

                (true, digest_matches && signer_known)
            }
        };

        let findings = Self::compliance_findings(list);
        let compliant = findings.is_empty();
        diagnostics.extend(findings);

        Ok(ValidationResult {
            signature_found,
            signature_intact,
            compliant,
            diagnostics,
        })
    }
}
