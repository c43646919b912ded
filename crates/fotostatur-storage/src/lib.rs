//! S3-compatible object storage client.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait (download/upload bytes)
//! - An AWS SDK backed implementation
//! - `s3://bucket/prefix` location parsing

pub mod client;
pub mod error;
pub mod uri;

pub use client::{ObjectStore, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use uri::S3Location;
