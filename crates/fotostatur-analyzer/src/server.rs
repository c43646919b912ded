//! HTTP trigger.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use fotostatur_models::StorageEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use thiserror::Error;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AnalyzerError;
use crate::handler::EventHandler;
use crate::pipeline::PipelineOutcome;

/// Event notifications are small; anything larger is not one.
const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<EventHandler>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable event: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::Event(e) => ApiError::Unprocessable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub outcomes: Vec<PipelineOutcome>,
}

/// Liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Analyze every image named by a storage event notification.
pub async fn handle_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EventResponse>, ApiError> {
    let event: StorageEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected malformed event: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    let outcomes = state.handler.handle(&event).await?;
    Ok(Json(EventResponse { outcomes }))
}

/// Create the HTTP router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .route("/health", get(health))
        .route("/events", post(handle_event))
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(MAX_EVENT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecisionConfig;
    use crate::detectors::{DetectionBatch, Detector};
    use crate::dispatcher::{ActionDispatcher, DispatchReport};
    use crate::error::DetectorError;
    use crate::pipeline::Pipeline;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use fotostatur_models::{Decision, DetectorKind, ImageReference};
    use std::time::Duration;
    use tower::ServiceExt;

    struct EchoDetector;

    #[async_trait]
    impl Detector for EchoDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::Label
        }

        async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError> {
            Ok(DetectionBatch::from_pairs(DetectorKind::Label, [(image.key.clone(), 60.0)]))
        }
    }

    struct NoopDispatcher;

    #[async_trait]
    impl ActionDispatcher for NoopDispatcher {
        async fn dispatch(&self, _decision: Decision, _image: &ImageReference) -> Option<DispatchReport> {
            None
        }
    }

    fn app() -> Router {
        let pipeline = Pipeline::new(
            DecisionConfig::default(),
            vec![Arc::new(EchoDetector) as Arc<dyn Detector>],
            Arc::new(NoopDispatcher),
        );
        let handler = EventHandler::new(Arc::new(pipeline), 2, Duration::from_secs(5));
        create_router(
            AppState {
                handler: Arc::new(handler),
            },
            None,
        )
    }

    async fn post_event(body: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_event_returns_outcomes() {
        let body = r#"{"Records":[{"s3":{"bucket":{"name":"uploads"},"object":{"key":"holiday+photos/cat%21.jpg"}}}]}"#;
        let (status, json) = post_event(body).await;

        assert_eq!(status, StatusCode::OK);
        let outcome = &json["outcomes"][0];
        assert_eq!(outcome["image"]["key"], "holiday photos/cat!.jpg");
        assert_eq!(outcome["final_score"], 60.0);
        assert_eq!(outcome["decision"], "accept");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, json) = post_event("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["detail"].as_str().unwrap().starts_with("Bad request"));
    }

    #[tokio::test]
    async fn test_event_without_records_is_unprocessable() {
        let (status, _) = post_event(r#"{"Records":[]}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let response = app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
