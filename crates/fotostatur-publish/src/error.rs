//! Publish error types.

use thiserror::Error;

pub type PublishResult<T> = Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publishing credentials have not been set")]
    MissingCredentials,

    #[error("Invalid signing key: {0}")]
    Signing(String),

    #[error("Publish rejected with status {0}: {1}")]
    Rejected(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PublishError {
    /// HTTP status of a rejected publish, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PublishError::Rejected(status, _) => Some(*status),
            _ => None,
        }
    }
}
