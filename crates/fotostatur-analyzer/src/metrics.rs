//! Prometheus metrics for the analyzer.

use fotostatur_models::{Decision, DetectorKind};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{AnalyzerError, AnalyzerResult};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> AnalyzerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AnalyzerError::config_error(format!("metrics recorder: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "analyzer_runs_total";
    pub const RUN_TIMEOUTS_TOTAL: &str = "analyzer_run_timeouts_total";
    pub const DETECTOR_FAILURES_TOTAL: &str = "analyzer_detector_failures_total";
    pub const PUBLISH_FAILURES_TOTAL: &str = "analyzer_publish_failures_total";
    pub const FINAL_SCORE: &str = "analyzer_final_score";
    pub const RUN_DURATION_SECONDS: &str = "analyzer_run_duration_seconds";
}

/// Record a finished run.
pub fn record_run(decision: Decision, final_score: Option<f64>, duration_secs: f64) {
    let labels = [("decision", decision.as_str().to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS).record(duration_secs);
    if let Some(score) = final_score {
        histogram!(names::FINAL_SCORE).record(score);
    }
}

pub fn record_run_timeout() {
    counter!(names::RUN_TIMEOUTS_TOTAL).increment(1);
}

pub fn record_detector_failure(detector: DetectorKind) {
    let labels = [("detector", detector.as_str().to_string())];
    counter!(names::DETECTOR_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_publish_failure() {
    counter!(names::PUBLISH_FAILURES_TOTAL).increment(1);
}
