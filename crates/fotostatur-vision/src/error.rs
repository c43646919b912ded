//! Classification client error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Classification service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("Rate limited by classification service")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl VisionError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited,
            503 => Self::ServiceUnavailable(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(format!("classification service returned {}: {}", status, body)),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::ServiceUnavailable(_)
            | VisionError::ServerError(_, _)
            | VisionError::RateLimited
            | VisionError::Timeout(_) => true,
            VisionError::Network(e) => !e.is_decode(),
            _ => false,
        }
    }
}
