//! Profile-image publisher.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PublishError, PublishResult};
use crate::oauth::OAuthCredentials;

/// Endpoint that replaces the account's profile image.
pub const UPDATE_PROFILE_IMAGE_PATH: &str = "/1.1/account/update_profile_image.json";

/// Social publishing capability.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Set the account credentials used by subsequent posts.
    fn set_credentials(&self, credentials: OAuthCredentials);

    /// Publish an encoded image.
    async fn post_image(&self, data: Vec<u8>) -> PublishResult<()>;
}

/// Configuration for the publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// API base URL
    pub api_base: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twitter.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl PublisherConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("TWITTER_API_BASE")
                .unwrap_or_else(|_| "https://api.twitter.com".to_string()),
            timeout: Duration::from_secs(
                std::env::var("TWITTER_API_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// Publishes images as the account's profile image.
///
/// Requests are signed with OAuth 1.0a; the multipart body is not part of
/// the signature. No retries are attempted.
pub struct ProfileImagePublisher {
    http: Client,
    config: PublisherConfig,
    credentials: RwLock<Option<OAuthCredentials>>,
}

impl ProfileImagePublisher {
    pub fn new(config: PublisherConfig) -> PublishResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            config,
            credentials: RwLock::new(None),
        })
    }

    fn current_credentials(&self) -> Option<OAuthCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Publisher for ProfileImagePublisher {
    fn set_credentials(&self, credentials: OAuthCredentials) {
        *self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credentials);
    }

    async fn post_image(&self, data: Vec<u8>) -> PublishResult<()> {
        let credentials = self
            .current_credentials()
            .ok_or(PublishError::MissingCredentials)?;

        let url = format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            UPDATE_PROFILE_IMAGE_PATH
        );
        let nonce = Uuid::new_v4().simple().to_string();
        let authorization =
            credentials.authorization_header("POST", &url, &[], &nonce, Utc::now().timestamp())?;

        let size = data.len();
        debug!("Posting {} byte image to {}", size, url);

        let form = Form::new().part("image", Part::bytes(data).file_name("image"));
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(status.as_u16(), body));
        }

        info!("Published {} byte image as profile image", size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> ProfileImagePublisher {
        ProfileImagePublisher::new(PublisherConfig {
            api_base: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn credentials() -> OAuthCredentials {
        OAuthCredentials::new("consumer", "consumer-secret", "token", "token-secret")
    }

    #[tokio::test]
    async fn test_post_without_credentials_fails() {
        let server = MockServer::start().await;
        let result = publisher(&server).post_image(vec![1, 2, 3]).await;
        assert!(matches!(result, Err(PublishError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_post_signed_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPDATE_PROFILE_IMAGE_PATH))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = publisher(&server);
        publisher.set_credentials(credentials());
        publisher.post_image(vec![0x89, 0x50, 0x4e, 0x47]).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_post_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPDATE_PROFILE_IMAGE_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad auth"))
            .mount(&server)
            .await;

        let publisher = publisher(&server);
        publisher.set_credentials(credentials());
        let err = publisher.post_image(vec![1]).await.unwrap_err();
        assert_eq!(err.http_status(), Some(401));
    }

    #[test]
    fn test_config_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.api_base, "https://api.twitter.com");
    }
}
