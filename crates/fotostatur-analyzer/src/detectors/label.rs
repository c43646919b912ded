use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_models::{DetectorKind, ImageReference};
use fotostatur_vision::ClassificationService;
use tracing::debug;

use super::{findings_json, DetectionBatch, Detector};
use crate::error::DetectorError;

/// One criterion per object or scene label.
pub struct LabelDetector {
    service: Arc<dyn ClassificationService>,
}

impl LabelDetector {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Detector for LabelDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Label
    }

    async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError> {
        let labels = self.service.labels(image).await?;
        debug!(
            image = %image,
            count = labels.len(),
            findings = %findings_json(&labels),
            "Labels detected"
        );

        Ok(DetectionBatch::from_pairs(
            DetectorKind::Label,
            labels.into_iter().map(|label| (label.name, label.confidence)),
        ))
    }
}
