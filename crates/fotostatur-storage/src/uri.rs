//! `s3://bucket/prefix` locations.

use std::fmt;

use crate::error::{StorageError, StorageResult};

/// A bucket plus an optional key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    /// Key prefix without leading or trailing slashes (may be empty)
    pub prefix: String,
}

impl S3Location {
    /// Parse `s3://bucket`, `s3://bucket/prefix` or `bucket/prefix`.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let trimmed = uri.trim();
        let path = trimmed.strip_prefix("s3://").unwrap_or(trimmed);
        let (bucket, prefix) = match path.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (path, ""),
        };

        if bucket.is_empty() {
            return Err(StorageError::invalid_uri(uri));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Key for `file_name` under this prefix.
    pub fn key_for(&self, file_name: &str) -> String {
        let file_name = file_name.trim_start_matches('/');
        if self.prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.prefix, file_name)
        }
    }
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.prefix)
        }
    }
}
