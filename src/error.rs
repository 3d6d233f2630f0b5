//! Error types for the triage pipeline.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox fetch errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mailbox request failed: {0}")]
    RequestFailed(String),

    #[error("Mailbox returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed message payload: {0}")]
    InvalidPayload(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl LlmError {
    /// Retryable-condition predicate used by the retry controller.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Classification normalization errors.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("No parsable JSON object in model response: {raw}")]
    MalformedResponse { raw: String },
}

/// Row store append errors.
#[derive(Debug, thiserror::Error)]
pub enum RowStoreError {
    #[error("Row store request failed: {0}")]
    RequestFailed(String),

    #[error("Row store returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Per-run pipeline errors.
///
/// `Fetch` and `Ledger` abort a run; the other variants are per-ticket
/// failures recorded against a single message, never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Mailbox fetch failed: {0}")]
    Fetch(#[from] MailError),

    #[error("Classification failed: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Normalize(#[from] NormalizeError),

    #[error("Row store append failed: {0}")]
    RowStore(#[from] RowStoreError),

    #[error("Ledger snapshot failed: {0}")]
    Ledger(#[source] std::io::Error),
}
