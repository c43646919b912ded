//! Analyzer error types.

use std::time::Duration;

use fotostatur_models::{DetectorKind, EventError};
use fotostatur_vision::VisionError;
use serde::Serialize;
use thiserror::Error;

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid event: {0}")]
    Event(#[from] EventError),

    #[error("Run exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("Classification error: {0}")]
    Vision(#[from] VisionError),

    #[error("Storage error: {0}")]
    Storage(#[from] fotostatur_storage::StorageError),

    #[error("Publish error: {0}")]
    Publish(#[from] fotostatur_publish::PublishError),
}

impl AnalyzerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalyzerError::Timeout(_))
    }
}

/// A detector call that produced no batch.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Classification failed: {0}")]
    Classification(#[from] VisionError),

    #[error("Detector failed: {0}")]
    Failed(String),
}

impl DetectorError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Record of a detector that failed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorFailure {
    pub detector: DetectorKind,
    pub message: String,
}

impl DetectorFailure {
    pub fn new(detector: DetectorKind, error: &DetectorError) -> Self {
        Self {
            detector,
            message: error.to_string(),
        }
    }
}
