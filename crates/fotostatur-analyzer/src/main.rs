//! Image analyzer binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fotostatur_analyzer::detectors::default_detectors;
use fotostatur_analyzer::{
    create_router, metrics, AnalyzerConfig, AnalyzerResult, AppState, EventHandler, Pipeline,
    PublishingDispatcher,
};
use fotostatur_media::GrayscaleResizer;
use fotostatur_publish::{ProfileImagePublisher, PublisherConfig};
use fotostatur_storage::S3Client;
use fotostatur_vision::VisionClient;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("fotostatur=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting fotostatur-analyzer");

    let config = match AnalyzerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Analyzer config: threshold={}, headshot={}, attributes={:?}, host={}, port={}",
        config.decision.threshold,
        config.headshot,
        config.face_attributes,
        config.host,
        config.port
    );

    let state = match build_state(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn build_state(config: &AnalyzerConfig) -> AnalyzerResult<AppState> {
    let vision = Arc::new(VisionClient::from_env()?);
    let storage = Arc::new(S3Client::from_env().await?);
    let publisher = Arc::new(ProfileImagePublisher::new(PublisherConfig::from_env())?);

    // Collaborators may come up after the analyzer, so failures only warn.
    match vision.health_check().await {
        Ok(true) => info!("Classification service is healthy"),
        Ok(false) => warn!("Classification service reported unhealthy"),
        Err(e) => warn!("Classification service health check failed: {}", e),
    }
    if let Err(e) = storage.check_connectivity(&config.headshot.bucket).await {
        warn!(bucket = %config.headshot.bucket, "{}", e);
    }

    let detectors = default_detectors(
        vision,
        config.headshot.clone(),
        config.face_attributes.clone(),
    );
    let dispatcher = PublishingDispatcher::new(
        storage,
        Arc::new(GrayscaleResizer::new(config.dispatch.resize_mode)),
        publisher,
        config.credentials.clone(),
        config.dispatch.clone(),
    );
    let pipeline = Pipeline::new(config.decision, detectors, Arc::new(dispatcher));
    info!("Pipeline ready with {} detectors", pipeline.detector_count());

    let handler = EventHandler::new(
        Arc::new(pipeline),
        config.max_concurrent_runs,
        config.run_timeout,
    );

    Ok(AppState {
        handler: Arc::new(handler),
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
