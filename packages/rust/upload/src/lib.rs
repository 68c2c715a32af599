//! Batched CRM upsert delivery.
//!
//! Partitions a validated, ordered contact set into contiguous batches of at
//! most `max_batch_size` records and submits each as one POST to the CRM's
//! batch-upsert endpoint. Batches go out sequentially in source order; a
//! failed batch is recorded and reported, never retried, and never stops the
//! batches behind it.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument, warn};
use url::Url;

use contactpipe_shared::{CanonicalContact, ContactPipeError, CrmConfig, Result, require_env};

/// User-Agent string for upload requests.
const USER_AGENT: &str = concat!("contactpipe/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Batch outcomes
// ---------------------------------------------------------------------------

/// Outcome of one batch submission.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Zero-based batch index in submission order.
    pub index: usize,
    /// Number of contacts in the batch.
    pub size: usize,
    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
    /// Whether the CRM accepted the batch (2xx).
    pub success: bool,
    /// Response body or transport error detail.
    pub detail: String,
}

/// Per-batch outcomes for a full upload pass.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    /// One entry per submitted batch, in submission order.
    pub batches: Vec<BatchResult>,
}

impl UploadOutcome {
    /// Number of batches the CRM accepted.
    pub fn accepted(&self) -> usize {
        self.batches.iter().filter(|b| b.success).count()
    }

    /// Number of batches that failed (non-2xx or transport error).
    pub fn failed(&self) -> usize {
        self.batches.len() - self.accepted()
    }
}

/// Sizes of the contiguous batches an upload of `total` records will produce.
pub fn partition_sizes(total: usize, max_batch_size: usize) -> Vec<usize> {
    if max_batch_size == 0 {
        return Vec::new();
    }
    let mut sizes = Vec::with_capacity(total.div_ceil(max_batch_size));
    let mut remaining = total;
    while remaining > 0 {
        let size = remaining.min(max_batch_size);
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

// ---------------------------------------------------------------------------
// CrmClient
// ---------------------------------------------------------------------------

/// HTTP client for the CRM batch-upsert endpoint.
pub struct CrmClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl CrmClient {
    /// Create a client against an explicit endpoint with an explicit API key.
    pub fn new(base_url: &str, upsert_path: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ContactPipeError::config(format!("invalid CRM base URL: {e}")))?;
        let endpoint = base
            .join(upsert_path)
            .map_err(|e| ContactPipeError::config(format!("invalid CRM upsert path: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ContactPipeError::Upload(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from config, reading the API key from the configured
    /// env var.
    pub fn from_config(config: &CrmConfig) -> Result<Self> {
        let api_key = require_env(&config.api_key_env, "CRM API key")?;
        Self::new(
            &config.base_url,
            &config.upsert_path,
            &api_key,
            config.timeout_secs,
        )
    }

    /// Submit `contacts` in order as batches of at most `max_batch_size`.
    ///
    /// Returns per-batch outcomes; only a nonsensical batch size is an error.
    #[instrument(skip_all, fields(contacts = contacts.len(), max_batch_size))]
    pub async fn upload(
        &self,
        contacts: &[CanonicalContact],
        max_batch_size: usize,
    ) -> Result<UploadOutcome> {
        if max_batch_size == 0 {
            return Err(ContactPipeError::validation(
                "max batch size must be at least 1",
            ));
        }

        let total_batches = contacts.len().div_ceil(max_batch_size);
        let mut outcome = UploadOutcome::default();

        for (index, batch) in contacts.chunks(max_batch_size).enumerate() {
            let result = self.submit_batch(index, batch).await;

            if result.success {
                info!(
                    batch = index + 1,
                    of = total_batches,
                    size = result.size,
                    status = result.status,
                    "batch accepted"
                );
            } else {
                warn!(
                    batch = index + 1,
                    of = total_batches,
                    size = result.size,
                    status = result.status,
                    detail = %result.detail,
                    "batch failed"
                );
            }

            outcome.batches.push(result);
        }

        Ok(outcome)
    }

    /// POST one batch and capture its outcome. Transport errors become a
    /// failed `BatchResult`, not an `Err` — later batches must still go out.
    async fn submit_batch(&self, index: usize, batch: &[CanonicalContact]) -> BatchResult {
        let body = serde_json::json!({ "inputs": batch });

        let response = self
            .client
            .post(self.endpoint.as_str())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                BatchResult {
                    index,
                    size: batch.len(),
                    status: Some(status.as_u16()),
                    success: status.is_success(),
                    detail,
                }
            }
            Err(e) => BatchResult {
                index,
                size: batch.len(),
                status: None,
                success: false,
                detail: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactpipe_shared::{ContactProperties, ID_PROPERTY_EMAIL};

    fn contact(email: &str) -> CanonicalContact {
        CanonicalContact {
            properties: ContactProperties {
                email: email.into(),
                ..Default::default()
            },
            id: email.into(),
            id_property: ID_PROPERTY_EMAIL.into(),
        }
    }

    fn contacts(n: usize) -> Vec<CanonicalContact> {
        (0..n).map(|i| contact(&format!("c{i}@x.com"))).collect()
    }

    fn client_for(server: &wiremock::MockServer) -> CrmClient {
        CrmClient::new(
            &server.uri(),
            "/crm/v3/objects/contacts/batch/upsert",
            "test-key",
            5,
        )
        .expect("build client")
    }

    #[test]
    fn partition_covers_every_record_in_ceil_batches() {
        assert_eq!(partition_sizes(7, 4), [4, 3]);
        assert_eq!(partition_sizes(8, 4), [4, 4]);
        assert_eq!(partition_sizes(3, 4), [3]);
        assert_eq!(partition_sizes(0, 4), Vec::<usize>::new());

        for (n, b) in [(1usize, 1usize), (10, 3), (100, 7), (5, 100)] {
            let sizes = partition_sizes(n, b);
            assert_eq!(sizes.len(), n.div_ceil(b));
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert!(sizes.iter().all(|&s| s >= 1 && s <= b));
        }
    }

    #[tokio::test]
    async fn upload_partitions_and_authorizes() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/crm/v3/objects/contacts/batch/upsert"))
            .and(wiremock::matchers::header("Authorization", "Bearer test-key"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "COMPLETE"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let outcome = client_for(&server).upload(&contacts(7), 4).await.unwrap();

        assert_eq!(outcome.batches.len(), 2);
        assert_eq!(outcome.accepted(), 2);
        assert_eq!(outcome.failed(), 0);
        assert_eq!(outcome.batches[0].size, 4);
        assert_eq!(outcome.batches[1].size, 3);
        assert!(outcome.batches[1].detail.contains("COMPLETE"));
    }

    #[tokio::test]
    async fn batch_bodies_carry_inputs_wrapper() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "inputs": [{
                    "id": "c0@x.com",
                    "idProperty": "email"
                }]
            })))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).upload(&contacts(1), 10).await.unwrap();
        assert_eq!(outcome.accepted(), 1);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_later_batches() {
        let server = wiremock::MockServer::start().await;

        // First call fails, later calls succeed
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(500).set_body_string("upstream exploded"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = client_for(&server).upload(&contacts(5), 2).await.unwrap();

        assert_eq!(outcome.batches.len(), 3);
        assert_eq!(outcome.failed(), 1);
        assert!(!outcome.batches[0].success);
        assert_eq!(outcome.batches[0].status, Some(500));
        assert!(outcome.batches[0].detail.contains("exploded"));
        assert!(outcome.batches[1].success);
        assert!(outcome.batches[2].success);
    }

    #[tokio::test]
    async fn transport_error_is_a_failed_batch_not_an_error() {
        // Nothing listening on this port
        let client = CrmClient::new("http://127.0.0.1:9", "/upsert", "k", 1).unwrap();

        let outcome = client.upload(&contacts(2), 10).await.unwrap();
        assert_eq!(outcome.batches.len(), 1);
        assert!(!outcome.batches[0].success);
        assert_eq!(outcome.batches[0].status, None);
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let server = wiremock::MockServer::start().await;
        let err = client_for(&server).upload(&contacts(3), 0).await.unwrap_err();
        assert!(matches!(err, ContactPipeError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_contact_set_sends_nothing() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server).upload(&[], 10).await.unwrap();
        assert!(outcome.batches.is_empty());
    }
}
