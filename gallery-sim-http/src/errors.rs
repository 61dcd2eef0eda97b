//! HTTP error types

use gallery_sim_resilience::Retryable;
use std::time::Duration;

/// Error type for pooled HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("Connection interrupted: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Server returned retryable status {status}")]
    RetryableStatus {
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<HttpError>,
    },

    #[error("Connection pool is closed")]
    PoolClosed,
}

impl HttpError {
    /// Classify a `reqwest` failure. Connect errors are always retryable.
    /// Timeouts, dropped connections and broken bodies are retryable for
    /// verbs the pool is allowed to replay. Builder, decode and redirect
    /// errors never are.
    pub(crate) fn from_transport(error: reqwest::Error, retry_eligible: bool) -> Self {
        if error.is_connect() {
            HttpError::Connect(error)
        } else if !retry_eligible {
            HttpError::NetworkError(error)
        } else if error.is_timeout() {
            HttpError::Timeout(error)
        } else if error.is_request() || error.is_body() {
            HttpError::Transport(error)
        } else {
            HttpError::NetworkError(error)
        }
    }

    /// Status code carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::RetryableStatus { status, .. } => Some(*status),
            HttpError::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }
}

impl Retryable for HttpError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            HttpError::Connect(_)
                | HttpError::Timeout(_)
                | HttpError::Transport(_)
                | HttpError::RetryableStatus { .. }
        )
    }

    fn retry_delay(&self) -> Option<Duration> {
        match self {
            HttpError::RetryableStatus { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
