//! Detectors: classification calls turned into scored criteria.
//!
//! Every detector wraps one [`ClassificationService`] call and converts its
//! raw findings into a [`DetectionBatch`]. Detectors never retry; an empty
//! finding list is an empty batch, not an error.

mod face_attribute;
mod face_compare;
mod label;
mod text;

use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_models::{Criterion, DetectorKind, ImageReference};
use fotostatur_vision::ClassificationService;
use serde::Serialize;

use crate::error::DetectorError;

pub use face_attribute::{AttributeSelector, FaceAttributeDetector};
pub use face_compare::FaceCompareDetector;
pub use label::LabelDetector;
pub use text::TextDetector;

/// Criteria produced by one detector invocation, in finding order.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBatch {
    kind: DetectorKind,
    criteria: Vec<Criterion>,
}

impl DetectionBatch {
    pub fn new(kind: DetectorKind) -> Self {
        Self {
            kind,
            criteria: Vec::new(),
        }
    }

    /// Build a batch from `(name, points)` pairs.
    pub fn from_pairs<I, S>(kind: DetectorKind, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut batch = Self::new(kind);
        for (name, points) in pairs {
            batch.push(name, points);
        }
        batch
    }

    pub fn push(&mut self, name: impl Into<String>, points: f64) {
        self.criteria.push(Criterion::new(name, points, self.kind));
    }

    pub fn kind(&self) -> DetectorKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn into_criteria(self) -> Vec<Criterion> {
        self.criteria
    }
}

/// One classification stage.
#[async_trait]
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError>;
}

/// The four production detectors, in the order their batches are merged.
pub fn default_detectors(
    service: Arc<dyn ClassificationService>,
    headshot: ImageReference,
    selectors: Vec<AttributeSelector>,
) -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(LabelDetector::new(Arc::clone(&service))),
        Arc::new(TextDetector::new(Arc::clone(&service))),
        Arc::new(FaceCompareDetector::new(Arc::clone(&service), headshot)),
        Arc::new(FaceAttributeDetector::new(service, selectors)),
    ]
}

/// Raw findings as a JSON array, for the debug audit trail.
pub(crate) fn findings_json<T: Serialize>(findings: &[T]) -> String {
    serde_json::to_string(findings).unwrap_or_else(|_| "[]".to_string())
}


#[cfg(test)]
mod tests {
    use super::testing::FakeService;
    use super::*;
    use fotostatur_models::Label;

    #[test]
    fn test_batch_tags_source() {
        let batch = DetectionBatch::from_pairs(DetectorKind::Text, [("A", 1.0), ("B", 2.0)]);
        assert_eq!(batch.len(), 2);
        assert!(batch
            .criteria()
            .iter()
            .all(|c| c.source == DetectorKind::Text));
    }

    #[test]
    fn test_default_detector_order() {
        let service = Arc::new(FakeService {
            labels: Some(vec![Label {
                name: "Cat".to_string(),
                confidence: 90.0,
            }]),
            ..Default::default()
        });
        let detectors = default_detectors(
            service,
            ImageReference::new("photos", "headshot.jpg"),
            vec![AttributeSelector::any("mustache")],
        );
        let kinds: Vec<_> = detectors.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                DetectorKind::Label,
                DetectorKind::Text,
                DetectorKind::FaceCompare,
                DetectorKind::FaceAttribute
            ]
        );
        assert_eq!(detectors[2].name(), "face_compare");
    }

    #[test]
    fn test_findings_json_keeps_raw_findings() {
        let labels = vec![Label {
            name: "Cat".to_string(),
            confidence: 90.5,
        }];
        assert_eq!(findings_json(&labels), r#"[{"name":"Cat","confidence":90.5}]"#);
        assert_eq!(findings_json::<Label>(&[]), "[]");
    }
}
