//! Cloud upload client.
//!
//! Grounded in the teacher's `GatewayClient`/`BlockingGatewayClient`
//! (`gateway.rs`): bearer-token auth is replaced with HMAC-SHA256 request
//! signing over `nonce || timestamp || body`, and a bounded retry loop is
//! added for transient failures — see SPEC_FULL.md §4.8. Requires the
//! `gateway` feature (pulls in `reqwest`).

use crate::error::UploadError;
use crate::exporter::HsiSnapshot;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const SDK_VERSION: &str = "1.0.0";

/// Static configuration for the upload client.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoint: String,
    pub tenant_id: String,
    pub signing_key: Vec<u8>,
    pub api_key: String,
    pub subject_id: String,
    pub subject_type: String,
    /// Additional attempts after the first, for transient failures only.
    pub max_retries: u32,
    pub max_queue_size: usize,
}

/// Identifies who a batch of snapshots belongs to — SPEC_FULL.md §4.8/§6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSubject {
    pub subject_type: String,
    pub subject_id: String,
}

/// Wire body for `POST /v1/hsi/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub subject: UploadSubject,
    pub snapshots: Vec<HsiSnapshot>,
}

/// Decoded 2xx response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    pub timestamp: String,
}

fn sign(key: &[u8], nonce: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(nonce.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn status_to_upload_error(status: reqwest::StatusCode, body: &str) -> UploadError {
    match status.as_u16() {
        400 => UploadError::SchemaValidation(body.to_string()),
        401 => UploadError::InvalidSignature,
        403 => UploadError::InvalidTenant(body.to_string()),
        429 => {
            let retry_after_s = body.trim().parse().unwrap_or(60);
            UploadError::RateLimitExceeded { retry_after_s }
        }
        500..=599 => UploadError::Network(format!("server error {status}: {body}")),
        _ => UploadError::Unexpected(format!("status {status}: {body}")),
    }
}

/// Bounded, drop-oldest FIFO queue of snapshots awaiting upload.
pub struct UploadQueue {
    items: Mutex<VecDeque<HsiSnapshot>>,
    max_size: usize,
}

impl UploadQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            max_size,
        }
    }

    /// Enqueue a snapshot, dropping the oldest queued item if at capacity.
    pub fn enqueue(&self, snapshot: HsiSnapshot) {
        let mut items = self.items.lock().expect("upload queue mutex poisoned");
        if items.len() >= self.max_size {
            items.pop_front();
        }
        items.push_back(snapshot);
    }

    pub fn dequeue(&self) -> Option<HsiSnapshot> {
        self.items.lock().expect("upload queue mutex poisoned").pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("upload queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Async HSI upload client with HMAC-signed requests and transient retry.
pub struct UploadClient {
    config: UploadConfig,
    http: reqwest::Client,
    pub queue: UploadQueue,
}

impl UploadClient {
    pub fn new(config: UploadConfig) -> Self {
        let max_queue_size = config.max_queue_size;
        Self {
            config,
            http: reqwest::Client::new(),
            queue: UploadQueue::new(max_queue_size),
        }
    }

    /// Upload one snapshot, retrying transient failures up to
    /// `max_retries` additional times with exponential backoff.
    pub async fn upload(&self, snapshot: &HsiSnapshot) -> Result<UploadResponse, UploadError> {
        let mut backoff = ExponentialBackoff::default();
        let mut attempt: u32 = 0;
        loop {
            match self.send_once(snapshot).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "transient upload failure, retrying");
                    if let Some(delay) = backoff.next_backoff() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drain and upload the queue in FIFO order, stopping at the first
    /// permanent failure (the offending snapshot is not re-queued).
    pub async fn flush(&self) -> Result<usize, UploadError> {
        let mut uploaded = 0;
        while let Some(snapshot) = self.queue.dequeue() {
            self.upload(&snapshot).await?;
            uploaded += 1;
        }
        Ok(uploaded)
    }

    async fn send_once(&self, snapshot: &HsiSnapshot) -> Result<UploadResponse, UploadError> {
        let request = UploadRequest {
            subject: UploadSubject {
                subject_type: self.config.subject_type.clone(),
                subject_id: self.config.subject_id.clone(),
            },
            snapshots: vec![snapshot.clone()],
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| UploadError::Unexpected(format!("encoding snapshot: {e}")))?;
        let nonce = uuid::Uuid::new_v4().to_string();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();
        let signature = sign(&self.config.signing_key, &nonce, &timestamp, &body);

        let response = self
            .http
            .post(format!("{}/v1/hsi/snapshots", self.config.endpoint))
            .header("X-Synheart-Tenant", &self.config.tenant_id)
            .header("X-Synheart-Nonce", &nonce)
            .header("X-Synheart-Timestamp", &timestamp)
            .header("X-Synheart-Signature", signature)
            .header("X-Synheart-SDK-Version", SDK_VERSION)
            .header("X-API-Key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return serde_json::from_str(&body_text)
                .map_err(|e| UploadError::Unexpected(format!("decoding response: {e}")));
        }
        Err(status_to_upload_error(status, &body_text))
    }
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::{HsiAxes, HsiMeta, HsiPrivacy, HsiProducer};
    use std::collections::HashMap;

    fn sample_snapshot() -> HsiSnapshot {
        HsiSnapshot {
            hsi_version: "1.0".to_string(),
            observed_at_utc: chrono::Utc::now(),
            computed_at_utc: chrono::Utc::now(),
            producer: HsiProducer {
                name: "test".to_string(),
                version: "0.0.0".to_string(),
                instance_id: "instance-1".to_string(),
            },
            window_ids: vec!["micro_window:2026-01-01T00:00:00Z".to_string()],
            windows: HashMap::new(),
            axes: HsiAxes::default(),
            embeddings: vec![],
            privacy: HsiPrivacy::default(),
            meta: HsiMeta {
                sdk: "test/0.0.0".to_string(),
                platform: "test".to_string(),
                sampling_rate_hz: 1.0,
            },
        }
    }

    #[test]
    fn queue_drops_oldest_when_full() {
        let queue = UploadQueue::new(2);
        queue.enqueue(sample_snapshot());
        queue.enqueue(sample_snapshot());
        queue.enqueue(sample_snapshot());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn signature_is_deterministic_for_same_inputs() {
        let key = b"secret".to_vec();
        let a = sign(&key, "nonce-1", "1000", b"body");
        let b = sign(&key, "nonce-1", "1000", b"body");
        assert_eq!(a, b);
        let c = sign(&key, "nonce-2", "1000", b"body");
        assert_ne!(a, c);
    }

    #[test]
    fn status_codes_map_to_permanent_vs_transient() {
        let schema = status_to_upload_error(reqwest::StatusCode::BAD_REQUEST, "bad field");
        assert!(!schema.is_transient());
        let server = status_to_upload_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(server.is_transient());
    }
}
