//! Detector orchestration and the accept/reject decision.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fotostatur_models::{Criterion, Decision, ImageReference, RunId};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, Instrument};

use crate::config::DecisionConfig;
use crate::detectors::Detector;
use crate::dispatcher::{ActionDispatcher, DispatchReport};
use crate::error::{AnalyzerError, AnalyzerResult, DetectorFailure};
use crate::logging::RunLogger;
use crate::metrics;
use crate::scoring::ScoreAccumulator;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Created,
    Running,
    Scored,
    Decided,
    Terminated,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Created => "created",
            PipelineStage::Running => "running",
            PipelineStage::Scored => "scored",
            PipelineStage::Decided => "decided",
            PipelineStage::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Result of analyzing one image.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub image: ImageReference,
    /// Every criterion that contributed to the score, in merge order
    pub criteria: Vec<Criterion>,
    /// Mean of all criteria; `None` when no criterion was produced
    pub final_score: Option<f64>,
    pub decision: Decision,
    pub detector_failures: Vec<DetectorFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchReport>,
    /// Set when the run did not complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineOutcome {
    /// Outcome for a run that was abandoned before a decision.
    pub fn failed(run_id: RunId, image: ImageReference, error: &AnalyzerError) -> Self {
        Self {
            run_id,
            image,
            criteria: Vec::new(),
            final_score: None,
            decision: Decision::Reject,
            detector_failures: Vec::new(),
            dispatch: None,
            error: Some(error.to_string()),
        }
    }
}

struct Evaluation {
    outcome: PipelineOutcome,
    logger: RunLogger,
    started: Instant,
}

/// Runs every detector against an image, scores the findings and hands
/// the decision to the dispatcher.
///
/// The pipeline holds no per-run state; one instance serves any number of
/// concurrent runs.
pub struct Pipeline {
    decision: DecisionConfig,
    detectors: Vec<Arc<dyn Detector>>,
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl Pipeline {
    pub fn new(
        decision: DecisionConfig,
        detectors: Vec<Arc<dyn Detector>>,
        dispatcher: Arc<dyn ActionDispatcher>,
    ) -> Self {
        Self {
            decision,
            detectors,
            dispatcher,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.decision.threshold
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Analyze `image` and dispatch the decision.
    pub async fn run(&self, image: &ImageReference) -> PipelineOutcome {
        let evaluation = self.evaluate(RunId::new(), image).await;
        self.terminate(evaluation).await
    }

    /// Like [`Pipeline::run`], but abandons the run when detection and
    /// scoring do not finish within `deadline`. An abandoned run dispatches
    /// nothing.
    ///
    /// The caller supplies `run_id` so an abandoned run can still be
    /// reported under the id its log lines carry.
    pub async fn run_with_deadline(
        &self,
        run_id: RunId,
        image: &ImageReference,
        deadline: Duration,
    ) -> AnalyzerResult<PipelineOutcome> {
        let evaluation = tokio::time::timeout(deadline, self.evaluate(run_id, image))
            .await
            .map_err(|_| {
                metrics::record_run_timeout();
                AnalyzerError::Timeout(deadline)
            })?;

        Ok(self.terminate(evaluation).await)
    }

    async fn evaluate(&self, run_id: RunId, image: &ImageReference) -> Evaluation {
        let logger = RunLogger::new(&run_id, image);
        let span = logger.create_span();

        async {
            let started = Instant::now();
            let mut stage = PipelineStage::Created;
            logger.log_start(self.detectors.len(), self.decision.threshold);

            advance(&mut stage, PipelineStage::Running);
            let results = join_all(self.detectors.iter().map(|detector| async move {
                (detector, detector.detect(image).await)
            }))
            .await;

            let mut accumulator = ScoreAccumulator::new();
            let mut failures = Vec::new();
            for (detector, result) in results {
                match result {
                    Ok(batch) => {
                        debug!(detector = detector.name(), criteria = batch.len(), "Detector finished");
                        accumulator.record_batch(batch);
                    }
                    Err(e) => {
                        logger.log_detector_failure(detector.name(), &e.to_string());
                        metrics::record_detector_failure(detector.kind());
                        failures.push(DetectorFailure::new(detector.kind(), &e));
                    }
                }
            }

            advance(&mut stage, PipelineStage::Scored);
            let final_score = accumulator.final_score();
            logger.log_breakdown(&accumulator.breakdown());

            advance(&mut stage, PipelineStage::Decided);
            let decision = Decision::from_score(final_score, self.decision.threshold);
            logger.log_decision(final_score, accumulator.count(), decision);

            Evaluation {
                outcome: PipelineOutcome {
                    run_id,
                    image: image.clone(),
                    criteria: accumulator.into_criteria(),
                    final_score,
                    decision,
                    detector_failures: failures,
                    dispatch: None,
                    error: None,
                },
                logger: logger.clone(),
                started,
            }
        }
        .instrument(span)
        .await
    }

    async fn terminate(&self, evaluation: Evaluation) -> PipelineOutcome {
        let Evaluation {
            mut outcome,
            logger,
            started,
        } = evaluation;
        let span = logger.create_span();

        async {
            let mut stage = PipelineStage::Decided;
            advance(&mut stage, PipelineStage::Terminated);

            outcome.dispatch = self.dispatcher.dispatch(outcome.decision, &outcome.image).await;
            if let Some(error) = outcome.dispatch.as_ref().and_then(|r| r.error.as_deref()) {
                logger.log_dispatch_error(error);
            }

            metrics::record_run(
                outcome.decision,
                outcome.final_score,
                started.elapsed().as_secs_f64(),
            );
            logger.log_completion(outcome.decision, started.elapsed().as_secs_f64());
            outcome
        }
        .instrument(span)
        .await
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!(from = %stage, to = %next, "Pipeline stage");
    *stage = next;
}
