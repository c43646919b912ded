//! Classification service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use fotostatur_models::{FaceDetail, FaceMatch, ImageReference, Label, TextDetection};

use crate::error::{VisionError, VisionResult};
use crate::service::ClassificationService;
use crate::types::{
    CompareFacesRequest, CompareFacesResponse, FaceAttributesResponse, HealthResponse,
    ImageRequest, LabelsResponse, TextResponse,
};

/// Configuration for the classification client.
#[derive(Debug, Clone)]
pub struct VisionClientConfig {
    /// Base URL of the classification service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
}

impl Default for VisionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl VisionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VISION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("VISION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("VISION_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            base_delay: Duration::from_millis(500),
        }
    }
}

/// HTTP client for the classification service.
pub struct VisionClient {
    http: Client,
    config: VisionClientConfig,
}

impl VisionClient {
    /// Create a new classification client.
    pub fn new(config: VisionClientConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionClientConfig::from_env())
    }

    /// Check if the classification service is healthy.
    pub async fn health_check(&self) -> VisionResult<bool> {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Classification service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Classification service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// POST a JSON body and decode the JSON response, with retry.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> VisionResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        self.with_retry(path, || async {
            debug!("Sending classification request to {}", url);

            let response = self
                .http
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(VisionError::from_http_status(status.as_u16(), body));
            }

            let bytes = response.bytes().await.map_err(|e| self.map_transport_error(e))?;
            serde_json::from_slice::<R>(&bytes)
                .map_err(|e| VisionError::InvalidResponse(format!("{}: {}", path, e)))
        })
        .await
    }

    fn map_transport_error(&self, error: reqwest::Error) -> VisionError {
        if error.is_timeout() {
            VisionError::Timeout(self.config.timeout.as_secs())
        } else {
            VisionError::Network(error)
        }
    }

    /// Execute with bounded retry and exponential backoff.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> VisionResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = VisionResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.base_delay.saturating_mul(2u32.pow(attempt));
                    warn!(
                        operation = %operation_name,
                        attempt = attempt + 1,
                        "Classification request failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| VisionError::request_failed("Unknown error")))
    }
}

#[async_trait]
impl ClassificationService for VisionClient {
    async fn labels(&self, image: &ImageReference) -> VisionResult<Vec<Label>> {
        let response: LabelsResponse = self.post_json("/labels", &ImageRequest::new(image)).await?;
        Ok(response.labels)
    }

    async fn text(&self, image: &ImageReference) -> VisionResult<Vec<TextDetection>> {
        let response: TextResponse = self.post_json("/text", &ImageRequest::new(image)).await?;
        Ok(response.text_detections)
    }

    async fn compare_faces(
        &self,
        target: &ImageReference,
        source: &ImageReference,
    ) -> VisionResult<Vec<FaceMatch>> {
        let request = CompareFacesRequest {
            source: source.clone(),
            target: target.clone(),
        };
        let response: CompareFacesResponse = self.post_json("/faces/compare", &request).await?;
        Ok(response.face_matches)
    }

    async fn face_attributes(&self, image: &ImageReference) -> VisionResult<Vec<FaceDetail>> {
        let request = ImageRequest::new(image).with_all_attributes();
        let response: FaceAttributesResponse = self.post_json("/faces/attributes", &request).await?;
        Ok(response.face_details)
    }
}
