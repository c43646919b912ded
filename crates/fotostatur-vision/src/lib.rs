//! Client for the image classification service.
//!
//! The service labels objects and scenes, finds text, compares faces against
//! a reference image, and reports facial attributes. This crate exposes that
//! capability as the [`ClassificationService`] trait and provides an HTTP
//! implementation with bounded retry and a request timeout.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{VisionClient, VisionClientConfig};
pub use error::{VisionError, VisionResult};
pub use service::ClassificationService;
