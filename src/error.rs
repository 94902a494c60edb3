//! Typed error taxonomy for the HSI core and the upload client.
//!
//! Mirrors `synheart-flux`'s `ComputeError` in using `thiserror` rather than
//! hand-written `Display`/`Error` impls — see DESIGN.md.

use thiserror::Error;

/// Errors surfaced by the core's lifecycle, ingestion, and fusion paths.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required cloud credentials for upload: {0}")]
    Config(String),

    #[error("adapter initialization failed: {0}")]
    SourceInit(String),

    #[error("internal error during fusion or extraction: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A single source's stream error. Logged, not fatal — the subscription
/// to that source is kept alive (see SPEC_FULL.md §4.1).
#[derive(Debug, Error)]
#[error("source stream error on {source_name}: {message}")]
pub struct SourceStreamError {
    pub source_name: String,
    pub message: String,
}

/// Errors surfaced by the upload client. Permanent variants are never
/// retried; `Network` is retried internally up to `max_retries`.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid tenant: {0}")]
    InvalidTenant(String),

    #[error("rate limit exceeded, retry after {retry_after_s}s")]
    RateLimitExceeded { retry_after_s: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected server response: {0}")]
    Unexpected(String),
}

impl UploadError {
    /// Permanent errors are surfaced immediately; only `Network` is transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, UploadError::Network(_))
    }
}
