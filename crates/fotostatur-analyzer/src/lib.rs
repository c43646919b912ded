//! Image analyzer core.
//!
//! This crate provides:
//! - Detectors that turn classification findings into scored criteria
//! - Score aggregation and the accept/reject decision
//! - The publishing dispatcher for accepted images
//! - Storage event handling and the HTTP trigger

pub mod config;
pub mod detectors;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod scoring;
pub mod server;

pub use config::{AnalyzerConfig, DecisionConfig, DispatchConfig};
pub use detectors::{AttributeSelector, DetectionBatch, Detector};
pub use dispatcher::{ActionDispatcher, DispatchReport, PublishingDispatcher};
pub use error::{AnalyzerError, AnalyzerResult, DetectorError, DetectorFailure};
pub use handler::EventHandler;
pub use logging::RunLogger;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStage};
pub use scoring::ScoreAccumulator;
pub use server::{create_router, AppState};
