//! Downstream action for decided runs.

use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_media::{content_type, ImageTransform};
use fotostatur_models::{Decision, ImageReference};
use fotostatur_publish::{OAuthCredentials, Publisher};
use fotostatur_storage::ObjectStore;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::DispatchConfig;
use crate::metrics;

/// What happened while dispatching an accepted image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub downloaded_bytes: usize,
    pub transformed_bytes: usize,
    /// Key of the persisted transformed image, when persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_key: Option<String>,
    pub published: bool,
    /// First failed step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchReport {
    fn failed(mut self, message: String) -> Self {
        self.error = Some(message);
        self
    }
}

/// Acts on a decision. Never fails the run: problems are logged and
/// reported.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Returns `None` when the decision required no action.
    async fn dispatch(&self, decision: Decision, image: &ImageReference) -> Option<DispatchReport>;
}

/// Downloads, transforms, optionally persists, and publishes accepted
/// images.
pub struct PublishingDispatcher {
    store: Arc<dyn ObjectStore>,
    transform: Arc<dyn ImageTransform>,
    publisher: Arc<dyn Publisher>,
    credentials: OAuthCredentials,
    config: DispatchConfig,
}

impl PublishingDispatcher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        transform: Arc<dyn ImageTransform>,
        publisher: Arc<dyn Publisher>,
        credentials: OAuthCredentials,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            transform,
            publisher,
            credentials,
            config,
        }
    }

    async fn transform(&self, data: Vec<u8>) -> Result<Vec<u8>, String> {
        let transform = Arc::clone(&self.transform);
        let (width, height) = (self.config.width, self.config.height);

        tokio::task::spawn_blocking(move || transform.resize_and_grayscale(&data, width, height))
            .await
            .map_err(|e| format!("transform task failed: {}", e))?
            .map_err(|e| format!("transform failed: {}", e))
    }

    async fn persist(&self, image: &ImageReference, data: &[u8]) -> Option<String> {
        let target = self.config.output_location(image);

        match self
            .store
            .upload(&target.bucket, &target.key, data.to_vec(), content_type(data))
            .await
        {
            Ok(()) => {
                info!(image = %image, target = %target, "Persisted transformed image");
                Some(target.key)
            }
            Err(e) => {
                warn!(image = %image, target = %target, "Failed to persist transformed image: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ActionDispatcher for PublishingDispatcher {
    async fn dispatch(&self, decision: Decision, image: &ImageReference) -> Option<DispatchReport> {
        if !decision.is_accept() {
            info!(image = %image, "Image rejected, nothing to dispatch");
            return None;
        }

        let mut report = DispatchReport::default();

        let original = match self.store.download(&image.bucket, &image.key).await {
            Ok(data) => data,
            Err(e) => {
                error!(image = %image, "Download failed: {}", e);
                return Some(report.failed(format!("download failed: {}", e)));
            }
        };
        report.downloaded_bytes = original.len();

        let transformed = match self.transform(original).await {
            Ok(data) => data,
            Err(message) => {
                error!(image = %image, "{}", message);
                return Some(report.failed(message));
            }
        };
        report.transformed_bytes = transformed.len();

        if self.config.persist_transformed {
            report.persisted_key = self.persist(image, &transformed).await;
        }

        self.publisher.set_credentials(self.credentials.clone());
        match self.publisher.post_image(transformed).await {
            Ok(()) => {
                info!(image = %image, "Published transformed image");
                report.published = true;
                Some(report)
            }
            Err(e) => {
                error!(image = %image, "Publish failed: {}", e);
                metrics::record_publish_failure();
                Some(report.failed(format!("publish failed: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fotostatur_media::{MediaError, MediaResult};
    use fotostatur_publish::{PublishError, PublishResult};
    use fotostatur_storage::{StorageError, StorageResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        fail_download: bool,
        fail_upload: bool,
        uploads: Mutex<Vec<(String, String, usize, String)>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn download(&self, _bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
            if self.fail_download {
                return Err(StorageError::not_found(key));
            }
            Ok(vec![7; 64])
        }

        async fn upload(
            &self,
            bucket: &str,
            key: &str,
            data: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<()> {
            if self.fail_upload {
                return Err(StorageError::upload_failed("bucket is read-only"));
            }
            self.uploads.lock().unwrap().push((
                bucket.to_string(),
                key.to_string(),
                data.len(),
                content_type.to_string(),
            ));
            Ok(())
        }
    }

    struct HalvingTransform;

    impl ImageTransform for HalvingTransform {
        fn resize_and_grayscale(&self, data: &[u8], width: u32, height: u32) -> MediaResult<Vec<u8>> {
            if width == 0 || height == 0 {
                return Err(MediaError::InvalidDimensions { width, height });
            }
            Ok(data[..data.len() / 2].to_vec())
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        reject: bool,
        credentials: Mutex<Option<OAuthCredentials>>,
        posted: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        fn set_credentials(&self, credentials: OAuthCredentials) {
            *self.credentials.lock().unwrap() = Some(credentials);
        }

        async fn post_image(&self, data: Vec<u8>) -> PublishResult<()> {
            if self.credentials.lock().unwrap().is_none() {
                return Err(PublishError::MissingCredentials);
            }
            if self.reject {
                return Err(PublishError::Rejected(403, "forbidden".to_string()));
            }
            self.posted.lock().unwrap().push(data.len());
            Ok(())
        }
    }

    fn credentials() -> OAuthCredentials {
        OAuthCredentials::new("ck", "cs", "at", "as")
    }

    fn dispatcher(
        store: Arc<FakeStore>,
        publisher: Arc<FakePublisher>,
        config: DispatchConfig,
    ) -> PublishingDispatcher {
        PublishingDispatcher::new(store, Arc::new(HalvingTransform), publisher, credentials(), config)
    }

    fn image() -> ImageReference {
        ImageReference::new("uploads", "2024/cat.jpg")
    }

    #[tokio::test]
    async fn test_reject_touches_nothing() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(FakePublisher::default());
        let report = dispatcher(store.clone(), publisher.clone(), DispatchConfig::default())
            .dispatch(Decision::Reject, &image())
            .await;

        assert!(report.is_none());
        assert!(publisher.credentials.lock().unwrap().is_none());
        assert!(publisher.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_transforms_and_publishes() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(FakePublisher::default());
        let report = dispatcher(store.clone(), publisher.clone(), DispatchConfig::default())
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert_eq!(report.downloaded_bytes, 64);
        assert_eq!(report.transformed_bytes, 32);
        assert!(report.published);
        assert!(report.error.is_none());
        assert!(report.persisted_key.is_none());
        assert_eq!(publisher.credentials.lock().unwrap().as_ref(), Some(&credentials()));
        assert_eq!(publisher.posted.lock().unwrap().as_slice(), &[32]);
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_before_publish() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(FakePublisher::default());
        let config = DispatchConfig {
            persist_transformed: true,
            ..Default::default()
        };
        let report = dispatcher(store.clone(), publisher, config)
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert_eq!(report.persisted_key.as_deref(), Some("resized/resize_cat.jpg"));
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, "uploads");
        assert_eq!(uploads[0].2, 32);
    }

    #[tokio::test]
    async fn test_download_failure_skips_publish() {
        let store = Arc::new(FakeStore {
            fail_download: true,
            ..Default::default()
        });
        let publisher = Arc::new(FakePublisher::default());
        let report = dispatcher(store, publisher.clone(), DispatchConfig::default())
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert!(!report.published);
        assert!(report.error.unwrap().starts_with("download failed"));
        assert!(publisher.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transform_failure_skips_publish() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(FakePublisher::default());
        let config = DispatchConfig {
            width: 0,
            ..Default::default()
        };
        let report = dispatcher(store, publisher.clone(), config)
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert_eq!(report.downloaded_bytes, 64);
        assert!(report.error.unwrap().starts_with("transform failed"));
        assert!(publisher.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_still_publishes() {
        let store = Arc::new(FakeStore {
            fail_upload: true,
            ..Default::default()
        });
        let publisher = Arc::new(FakePublisher::default());
        let config = DispatchConfig {
            persist_transformed: true,
            ..Default::default()
        };
        let report = dispatcher(store, publisher.clone(), config)
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert!(report.persisted_key.is_none());
        assert!(report.published);
        assert_eq!(publisher.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported() {
        let store = Arc::new(FakeStore::default());
        let publisher = Arc::new(FakePublisher {
            reject: true,
            ..Default::default()
        });
        let report = dispatcher(store, publisher, DispatchConfig::default())
            .dispatch(Decision::Accept, &image())
            .await
            .unwrap();

        assert!(!report.published);
        assert_eq!(report.transformed_bytes, 32);
        assert!(report.error.unwrap().contains("403"));
    }
}
