//! Storage event notifications.
//!
//! The analyzer is triggered by object-created notifications in the
//! `{"Records": [{"s3": {"bucket": {"name"}, "object": {"key"}}}]}` shape.
//! Object keys arrive form-encoded (`+` for spaces, percent escapes).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image::ImageReference;

/// Errors turning a notification into image references.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Event contains no records")]
    NoRecords,

    #[error("Record {0} has an empty bucket name")]
    EmptyBucket(usize),

    #[error("Record {0} has an empty object key")]
    EmptyKey(usize),

    #[error("Record {index} has an undecodable key: {message}")]
    InvalidKey { index: usize, message: String },
}

/// Object storage event notification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

/// One notification record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct S3Object {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StorageEvent {
    /// Decode every record into an image reference, in record order.
    pub fn image_references(&self) -> Result<Vec<ImageReference>, EventError> {
        if self.records.is_empty() {
            return Err(EventError::NoRecords);
        }

        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| record.image_reference(index))
            .collect()
    }
}

impl EventRecord {
    fn image_reference(&self, index: usize) -> Result<ImageReference, EventError> {
        let bucket = self.s3.bucket.name.trim();
        if bucket.is_empty() {
            return Err(EventError::EmptyBucket(index));
        }

        let key = decode_object_key(&self.s3.object.key).map_err(|message| {
            EventError::InvalidKey { index, message }
        })?;
        if key.is_empty() {
            return Err(EventError::EmptyKey(index));
        }

        Ok(ImageReference::new(bucket, key))
    }
}

/// Decode a form-encoded object key. A literal `+` arrives as `%2B`, so
/// plus signs are spaces.
fn decode_object_key(raw: &str) -> Result<String, String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| e.to_string())
}
