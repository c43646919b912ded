//! Shared data models for the Fotostatur image analyzer.
//!
//! This crate provides Serde-serializable types for:
//! - Image references and storage event notifications
//! - Scored criteria and accept/reject decisions
//! - Findings returned by the classification service

pub mod criterion;
pub mod event;
pub mod findings;
pub mod image;
pub mod run;

// Re-export common types
pub use criterion::{Criterion, Decision, DetectorKind};
pub use event::{EventError, EventRecord, StorageEvent};
pub use findings::{BoundingBox, FaceAttribute, FaceDetail, FaceMatch, Label, TextDetection};
pub use image::ImageReference;
pub use run::RunId;
