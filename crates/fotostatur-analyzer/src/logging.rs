//! Per-run structured logging.
//!
//! Each pipeline event is logged with the run ID and the image under
//! analysis, so the lines of one run can be filtered out of a busy log.

use fotostatur_models::{Decision, ImageReference, RunId};
use tracing::{error, info, warn, Span};

#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    image: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId, image: &ImageReference) -> Self {
        Self {
            run_id: run_id.to_string(),
            image: image.to_string(),
        }
    }

    pub fn log_start(&self, detectors: usize, threshold: f64) {
        info!(
            run_id = %self.run_id,
            image = %self.image,
            detectors,
            threshold,
            "Run started"
        );
    }

    pub fn log_detector_failure(&self, detector: &str, message: &str) {
        warn!(
            run_id = %self.run_id,
            image = %self.image,
            detector,
            "Detector failed: {}", message
        );
    }

    /// Per-criterion breakdown, as JSON.
    pub fn log_breakdown(&self, breakdown: &str) {
        info!(
            run_id = %self.run_id,
            image = %self.image,
            breakdown = %breakdown,
            "Score breakdown"
        );
    }

    pub fn log_decision(&self, score: Option<f64>, criteria: usize, decision: Decision) {
        match score {
            Some(score) => info!(
                run_id = %self.run_id,
                image = %self.image,
                score,
                criteria,
                decision = %decision,
                "Run decided"
            ),
            None => info!(
                run_id = %self.run_id,
                image = %self.image,
                decision = %decision,
                "Run decided without criteria"
            ),
        }
    }

    pub fn log_dispatch_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            image = %self.image,
            "Dispatch incomplete: {}", message
        );
    }

    pub fn log_completion(&self, decision: Decision, elapsed_secs: f64) {
        info!(
            run_id = %self.run_id,
            image = %self.image,
            decision = %decision,
            elapsed_secs,
            "Run completed"
        );
    }

    /// Span wrapping every stage of the run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, image = %self.image)
    }
}
