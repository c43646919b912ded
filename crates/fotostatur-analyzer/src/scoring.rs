//! Criteria aggregation.

use fotostatur_models::Criterion;

use crate::detectors::DetectionBatch;

/// Collects the criteria of one run and derives the final score.
///
/// The score is the unweighted mean of every recorded criterion, so a
/// detector that reports many findings weighs more than one that reports a
/// single finding. Criteria are never deduplicated or range-checked.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    criteria: Vec<Criterion>,
    total: f64,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one criterion.
    pub fn record(&mut self, criterion: Criterion) {
        self.total += criterion.points;
        self.criteria.push(criterion);
    }

    /// Append every criterion of a batch, in order.
    pub fn record_batch(&mut self, batch: DetectionBatch) {
        for criterion in batch.into_criteria() {
            self.record(criterion);
        }
    }

    pub fn count(&self) -> usize {
        self.criteria.len()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn into_criteria(self) -> Vec<Criterion> {
        self.criteria
    }

    /// Mean points over all criteria, or `None` when nothing was recorded.
    pub fn final_score(&self) -> Option<f64> {
        if self.criteria.is_empty() {
            None
        } else {
            Some(self.total / self.criteria.len() as f64)
        }
    }

    /// JSON rendering of the recorded criteria for audit logs.
    pub fn breakdown(&self) -> String {
        serde_json::to_string(&self.criteria).unwrap_or_else(|_| "[]".to_string())
    }
}
