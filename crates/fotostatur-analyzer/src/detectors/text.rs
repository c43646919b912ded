use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_models::{DetectorKind, ImageReference};
use fotostatur_vision::ClassificationService;
use tracing::debug;

use super::{findings_json, DetectionBatch, Detector};
use crate::error::DetectorError;

/// One criterion per detected text fragment.
pub struct TextDetector {
    service: Arc<dyn ClassificationService>,
}

impl TextDetector {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Detector for TextDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Text
    }

    async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError> {
        let fragments = self.service.text(image).await?;
        debug!(
            image = %image,
            count = fragments.len(),
            findings = %findings_json(&fragments),
            "Text detected"
        );

        Ok(DetectionBatch::from_pairs(
            DetectorKind::Text,
            fragments
                .into_iter()
                .map(|fragment| (fragment.text, fragment.confidence)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::FakeService;
    use fotostatur_models::TextDetection;

    #[tokio::test]
    async fn test_fragments_become_criteria() {
        let service = Arc::new(FakeService {
            text: Some(vec![
                TextDetection {
                    text: "HELLO".to_string(),
                    confidence: 96.0,
                },
                TextDetection {
                    text: String::new(),
                    confidence: 12.5,
                },
            ]),
            ..Default::default()
        });
        let batch = TextDetector::new(service)
            .detect(&ImageReference::new("b", "k.jpg"))
            .await
            .unwrap();

        let pairs: Vec<_> = batch
            .criteria()
            .iter()
            .map(|c| (c.name.as_str(), c.points))
            .collect();
        assert_eq!(pairs, vec![("HELLO", 96.0), ("", 12.5)]);
    }
}
