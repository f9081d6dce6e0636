//! End-to-end pipeline state transitions
//!
//! Drives a refresh job through the full download/parse/validate cycle with
//! an in-memory loader and checks the per-stage cache states the summary
//! reports after each refresh.

use async_trait::async_trait;
use base64::Engine;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tlcache::digest::sha256_hex;
use tlcache::{
    CacheState, DataLoader, JobSummary, MemoryDataLoader, RefreshJob, SignerCertificate, Source,
    TlResult,
};

const URL: &str = "https://tl.example/cz.json";

fn signer_der() -> Vec<u8> {
    b"example-signer-certificate".to_vec()
}

fn signer() -> SignerCertificate {
    SignerCertificate::from_der(signer_der())
}

fn list_body(sequence_number: u64, services: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "version": 1,
        "sequence_number": sequence_number,
        "issue_date": "2026-01-15T00:00:00Z",
        "next_update": "2026-07-15T00:00:00Z",
        "services": services,
    })
}

fn default_services() -> serde_json::Value {
    serde_json::json!([{
        "provider": "Example Qualified CA",
        "service_type": "http://uri.etsi.org/TrstSvc/Svctype/CA/QC",
        "status": "granted",
        "certificates": ["AAEC"]
    }])
}

fn sign(body: &serde_json::Value) -> serde_json::Value {
    let canonical = serde_json::to_vec(body).unwrap();
    serde_json::json!({
        "signer_certificate": base64::engine::general_purpose::STANDARD.encode(signer_der()),
        "payload_digest": sha256_hex(&canonical),
    })
}

/// Well-formed, compliant, signed by the expected signer
fn valid_doc() -> Vec<u8> {
    let body = list_body(7, default_services());
    let signature = sign(&body);
    serde_json::json!({"trust_list": body, "signature": signature})
        .to_string()
        .into_bytes()
}

/// Well-formed and compliant but carrying no signature block
fn unsigned_doc() -> Vec<u8> {
    serde_json::json!({"trust_list": list_body(7, default_services())})
        .to_string()
        .into_bytes()
}

/// Signature block whose digest does not cover the body
fn broken_sig_doc() -> Vec<u8> {
    let body = list_body(7, default_services());
    let mut signature = sign(&body);
    signature["payload_digest"] = serde_json::json!("ff".repeat(32));
    serde_json::json!({"trust_list": body, "signature": signature})
        .to_string()
        .into_bytes()
}

/// Recognizably a trust list, but fails schema compliance at parse time
fn non_compliant_doc() -> Vec<u8> {
    let mut body = list_body(7, default_services());
    body["version"] = serde_json::json!(99);
    serde_json::json!({"trust_list": body})
        .to_string()
        .into_bytes()
}

/// Valid structure with a compliance finding (no trust services)
fn empty_services_doc() -> Vec<u8> {
    let body = list_body(7, serde_json::json!([]));
    let signature = sign(&body);
    serde_json::json!({"trust_list": body, "signature": signature})
        .to_string()
        .into_bytes()
}

fn job_with(document: Option<Vec<u8>>) -> RefreshJob {
    let mut job = RefreshJob::new();
    job.set_sources(vec![Source::trusted_list(URL)
        .with_id("cz")
        .with_expected_signers(vec![signer()])]);
    job.set_data_loader(Arc::new(loader_with(document)));
    job
}

fn loader_with(document: Option<Vec<u8>>) -> MemoryDataLoader {
    let mut loader = MemoryDataLoader::new();
    if let Some(document) = document {
        loader.insert(URL, document);
    }
    loader
}

fn check(summary: &JobSummary, expected: (CacheState, CacheState, CacheState)) {
    let source = summary.source("cz").expect("source in summary");
    assert_eq!(source.states(), expected);
}

use tlcache::CacheState::{Desynchronized, Error, RefreshNeeded, Synchronized};

#[tokio::test]
async fn missing_document_errors_and_repeats() {
    let job = job_with(None);

    job.refresh().await;
    let first = job.summary().await;
    check(&first, (Error, RefreshNeeded, RefreshNeeded));

    job.refresh().await;
    let second = job.summary().await;
    check(&second, (Error, RefreshNeeded, RefreshNeeded));

    // the whole summary repeats, not just the states
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn missing_then_valid_document() {
    let mut job = job_with(None);

    job.refresh().await;
    check(&job.summary().await, (Error, RefreshNeeded, RefreshNeeded));

    job.set_data_loader(Arc::new(loader_with(Some(valid_doc()))));
    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );
}

#[tokio::test]
async fn valid_then_missing_document() {
    let mut job = job_with(Some(valid_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    // valid parse and validation results are still present
    job.set_data_loader(Arc::new(loader_with(None)));
    job.refresh().await;
    check(
        &job.summary().await,
        (Error, Desynchronized, Desynchronized),
    );
}

#[tokio::test]
async fn non_document_bytes() {
    let job = job_with(Some(b"%PDF-1.4 not a trust list".to_vec()));

    job.refresh().await;
    check(&job.summary().await, (Error, RefreshNeeded, RefreshNeeded));
}

#[tokio::test]
async fn wrong_root_document() {
    let job = job_with(Some(br#"{"catalogue": {"entries": []}}"#.to_vec()));

    job.refresh().await;
    check(&job.summary().await, (Error, RefreshNeeded, RefreshNeeded));
}

#[tokio::test]
async fn valid_document() {
    let job = job_with(Some(valid_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    job.synchronize().await;
    let result = job.published_validation("cz").await.unwrap();
    assert!(result.signature_found);
    assert!(result.signature_intact);
    assert!(result.compliant);
}

#[tokio::test]
async fn unsigned_document() {
    let job = job_with(Some(unsigned_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    job.synchronize().await;
    let result = job.published_validation("cz").await.unwrap();
    assert!(!result.signature_found);
    assert!(!result.signature_intact);
}

#[tokio::test]
async fn broken_signature_document() {
    let job = job_with(Some(broken_sig_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    job.synchronize().await;
    let result = job.published_validation("cz").await.unwrap();
    assert!(result.signature_found);
    assert!(!result.signature_intact);
}

#[tokio::test]
async fn non_compliant_document() {
    let job = job_with(Some(non_compliant_doc()));

    job.refresh().await;
    // parsing fails, and validation mirrors the changed download
    check(&job.summary().await, (Desynchronized, Error, Desynchronized));
}

#[tokio::test]
async fn missing_then_non_compliant_document() {
    let mut job = job_with(None);

    job.refresh().await;
    check(&job.summary().await, (Error, RefreshNeeded, RefreshNeeded));

    job.set_data_loader(Arc::new(loader_with(Some(non_compliant_doc()))));
    job.refresh().await;
    check(&job.summary().await, (Desynchronized, Error, Desynchronized));
}

#[tokio::test]
async fn repeated_non_compliant_refresh_is_stable() {
    let job = job_with(Some(non_compliant_doc()));

    job.refresh().await;
    job.refresh().await;
    check(&job.summary().await, (Desynchronized, Error, Desynchronized));
}

#[tokio::test]
async fn parsing_error_clears_when_content_reverts() {
    let mut job = job_with(Some(valid_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    job.set_data_loader(Arc::new(loader_with(Some(non_compliant_doc()))));
    job.refresh().await;
    check(&job.summary().await, (Desynchronized, Error, Desynchronized));

    // the source reverts to the previously-good document; the parse error
    // clears instead of sticking to a value that matches the download again
    job.set_data_loader(Arc::new(loader_with(Some(valid_doc()))));
    job.refresh().await;

    let summary = job.summary().await;
    check(
        &summary,
        (Desynchronized, Desynchronized, Desynchronized),
    );
    assert!(summary.source("cz").unwrap().parsing.error.is_none());
}

#[tokio::test]
async fn byte_identical_content_never_flips_synchronized() {
    let job = job_with(Some(valid_doc()));

    job.refresh().await;
    job.synchronize().await;
    check(
        &job.summary().await,
        (Synchronized, Synchronized, Synchronized),
    );

    job.refresh().await;
    check(
        &job.summary().await,
        (Synchronized, Synchronized, Synchronized),
    );
}

#[tokio::test]
async fn outage_preserves_synchronized_downstream() {
    let mut job = job_with(Some(valid_doc()));

    job.refresh().await;
    job.synchronize().await;

    job.set_data_loader(Arc::new(loader_with(None)));
    job.refresh().await;
    check(&job.summary().await, (Error, Synchronized, Synchronized));

    let source_summary = job.summary().await;
    let error = source_summary
        .source("cz")
        .unwrap()
        .download
        .error
        .clone()
        .unwrap();
    assert!(error.contains("Fetch failed"));
}

#[tokio::test]
async fn compliance_finding_is_a_result_not_an_error() {
    let job = job_with(Some(empty_services_doc()));

    job.refresh().await;
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Desynchronized),
    );

    job.synchronize().await;
    let result = job.published_validation("cz").await.unwrap();
    assert!(result.signature_intact);
    assert!(!result.compliant);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.contains("no trust services")));
}

#[tokio::test]
async fn reissued_list_with_same_validation_outcome() {
    let mut job = job_with(Some(valid_doc()));

    job.refresh().await;
    job.synchronize().await;

    let body = list_body(8, default_services());
    let signature = sign(&body);
    let reissued = serde_json::json!({"trust_list": body, "signature": signature})
        .to_string()
        .into_bytes();
    job.set_data_loader(Arc::new(loader_with(Some(reissued))));

    job.refresh().await;
    // new bytes and a new parse, but the validation outcome is identical
    check(
        &job.summary().await,
        (Desynchronized, Desynchronized, Synchronized),
    );

    job.synchronize().await;
    assert_eq!(job.published_list("cz").await.unwrap().sequence_number, 8);
}

#[tokio::test]
async fn baseline_invisible_until_synchronized() {
    let job = job_with(Some(valid_doc()));

    job.refresh().await;
    assert!(job.published_list("cz").await.is_none());

    job.synchronize().await;
    assert_eq!(job.published_list("cz").await.unwrap().sequence_number, 7);
}

#[tokio::test]
async fn eviction_is_explicit() {
    let mut job = job_with(Some(valid_doc()));
    job.refresh().await;
    job.synchronize().await;

    // dropping the source from the registered set leaves its entries alone
    job.set_sources(vec![]);
    assert!(job.published_list("cz").await.is_some());

    assert!(job.evict_source("cz").await);
    assert!(job.published_list("cz").await.is_none());
}

#[tokio::test]
async fn invalidation_forces_recompute_to_same_baseline() {
    let job = job_with(Some(valid_doc()));

    job.refresh().await;
    job.synchronize().await;

    job.invalidate_source("cz").await.unwrap();
    check(
        &job.summary().await,
        (RefreshNeeded, RefreshNeeded, RefreshNeeded),
    );

    // recomputing identical content lands back on the published baseline
    job.refresh().await;
    check(
        &job.summary().await,
        (Synchronized, Synchronized, Synchronized),
    );
}

#[tokio::test]
async fn fetch_deadline_is_a_normal_error() {
    struct StalledLoader;

    #[async_trait]
    impl DataLoader for StalledLoader {
        async fn fetch(&self, _url: &str) -> TlResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    tokio::time::pause();

    let mut job = job_with(None);
    job.set_data_loader(Arc::new(StalledLoader));
    job.set_fetch_timeout(Duration::from_millis(100));

    job.refresh().await;
    let summary = job.summary().await;
    check(&summary, (Error, RefreshNeeded, RefreshNeeded));
    assert!(summary
        .source("cz")
        .unwrap()
        .download
        .error
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn lotl_sources_refresh_before_tl_sources() {
    struct RecordingLoader {
        inner: MemoryDataLoader,
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DataLoader for RecordingLoader {
        async fn fetch(&self, url: &str) -> TlResult<Vec<u8>> {
            self.order.lock().unwrap().push(url.to_string());
            self.inner.fetch(url).await
        }
    }

    let lotl_url = "https://lotl.example/eu.json";
    let mut lotl_body = list_body(1, default_services());
    lotl_body["pointers"] = serde_json::json!([{"url": URL, "territory": "CZ"}]);
    let lotl_doc = serde_json::json!({"trust_list": lotl_body})
        .to_string()
        .into_bytes();

    let order = Arc::new(Mutex::new(Vec::new()));
    let loader = RecordingLoader {
        inner: MemoryDataLoader::new()
            .with_document(URL, valid_doc())
            .with_document(lotl_url, lotl_doc),
        order: order.clone(),
    };

    let mut job = RefreshJob::new();
    job.set_sources(vec![
        Source::trusted_list(URL).with_id("cz"),
        Source::list_of_lists(lotl_url, vec![]).with_id("eu-lotl"),
    ]);
    job.set_data_loader(Arc::new(loader));

    job.refresh().await;

    let fetched = order.lock().unwrap().clone();
    assert_eq!(fetched, vec![lotl_url.to_string(), URL.to_string()]);

    let summary = job.summary().await;
    let lotl = summary.source("eu-lotl").unwrap();
    assert_eq!(
        lotl.states(),
        (Desynchronized, Desynchronized, Desynchronized)
    );
    assert_eq!(
        job.summary().await.source("cz").unwrap().states(),
        (Desynchronized, Desynchronized, Desynchronized)
    );
}

#[tokio::test]
async fn independent_sources_fail_independently() {
    let sk_url = "https://tl.example/sk.json";
    let mut job = RefreshJob::new();
    job.set_sources(vec![
        Source::trusted_list(URL)
            .with_id("cz")
            .with_expected_signers(vec![signer()]),
        Source::trusted_list(sk_url).with_id("sk"),
    ]);
    job.set_data_loader(Arc::new(loader_with(Some(valid_doc()))));

    job.refresh().await;

    let summary = job.summary().await;
    assert_eq!(
        summary.source("cz").unwrap().states(),
        (Desynchronized, Desynchronized, Desynchronized)
    );
    assert_eq!(
        summary.source("sk").unwrap().states(),
        (Error, RefreshNeeded, RefreshNeeded)
    );
}
