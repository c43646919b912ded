//! Storage event handling.

use std::sync::Arc;
use std::time::Duration;

use fotostatur_models::{ImageReference, RunId, StorageEvent};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::pipeline::{Pipeline, PipelineOutcome};

/// Turns storage events into pipeline runs.
///
/// Each record is an independent run with its own deadline. The number of
/// runs in flight is bounded across all events handled by this instance.
pub struct EventHandler {
    pipeline: Arc<Pipeline>,
    run_semaphore: Arc<Semaphore>,
    run_timeout: Duration,
}

impl EventHandler {
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent_runs: usize, run_timeout: Duration) -> Self {
        Self {
            pipeline,
            run_semaphore: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
            run_timeout,
        }
    }

    /// Run the pipeline for every record of `event`.
    ///
    /// Outcomes are returned in record order. Only a malformed event is an
    /// error; a failed or timed out run is reported in its outcome.
    pub async fn handle(&self, event: &StorageEvent) -> AnalyzerResult<Vec<PipelineOutcome>> {
        let images = event.image_references()?;
        info!(records = images.len(), "Handling storage event");

        let runs = images.into_iter().map(|image| self.process(image));
        Ok(join_all(runs).await)
    }

    async fn process(&self, image: ImageReference) -> PipelineOutcome {
        let run_id = RunId::new();
        let _permit = match self.run_semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                let err = AnalyzerError::config_error("run limiter closed");
                return PipelineOutcome::failed(run_id, image, &err);
            }
        };

        match self
            .pipeline
            .run_with_deadline(run_id.clone(), &image, self.run_timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(run_id = %run_id, image = %image, "Run abandoned: {}", e);
                PipelineOutcome::failed(run_id, image, &e)
            }
        }
    }
}
