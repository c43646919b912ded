//! Image locator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque locator for an image held in object storage.
///
/// Passed unchanged to every detector and to the downstream
/// transform/publish collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ImageReference {
    /// Bucket (or container) name
    pub bucket: String,
    /// Object key (or path) inside the bucket
    pub key: String,
}

impl ImageReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last `/`-separated segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let image = ImageReference::new("photos", "uploads/2024/cat.jpg");
        assert_eq!(image.file_name(), "cat.jpg");

        let flat = ImageReference::new("photos", "cat.jpg");
        assert_eq!(flat.file_name(), "cat.jpg");
    }

    #[test]
    fn test_display() {
        let image = ImageReference::new("photos", "uploads/cat.jpg");
        assert_eq!(image.to_string(), "s3://photos/uploads/cat.jpg");
    }
}
