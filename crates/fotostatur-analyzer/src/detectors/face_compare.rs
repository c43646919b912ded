use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_models::{DetectorKind, ImageReference};
use fotostatur_vision::ClassificationService;
use tracing::debug;

use super::{findings_json, DetectionBatch, Detector};
use crate::error::DetectorError;

/// Similarity of faces in the subject image against a reference headshot.
///
/// The headshot is the comparison target and the subject image is the
/// source; each match yields one criterion named after the matched face.
pub struct FaceCompareDetector {
    service: Arc<dyn ClassificationService>,
    headshot: ImageReference,
}

impl FaceCompareDetector {
    pub fn new(service: Arc<dyn ClassificationService>, headshot: ImageReference) -> Self {
        Self { service, headshot }
    }

    pub fn headshot(&self) -> &ImageReference {
        &self.headshot
    }
}

#[async_trait]
impl Detector for FaceCompareDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FaceCompare
    }

    async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError> {
        let matches = self.service.compare_faces(&self.headshot, image).await?;
        debug!(
            image = %image,
            headshot = %self.headshot,
            count = matches.len(),
            findings = %findings_json(&matches),
            "Face matches found"
        );

        Ok(DetectionBatch::from_pairs(
            DetectorKind::FaceCompare,
            matches.iter().map(|m| (m.identifier(), m.similarity)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::FakeService;
    use fotostatur_models::{BoundingBox, FaceMatch};

    #[tokio::test]
    async fn test_headshot_is_target() {
        let service = Arc::new(FakeService {
            matches: Some(Vec::new()),
            ..Default::default()
        });
        let headshot = ImageReference::new("refs", "headshots/me.jpg");
        let subject = ImageReference::new("uploads", "new.jpg");

        let batch = FaceCompareDetector::new(service.clone(), headshot.clone())
            .detect(&subject)
            .await
            .unwrap();

        assert!(batch.is_empty());
        let calls = service.compared.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(headshot, subject)]);
    }

    #[tokio::test]
    async fn test_match_named_by_id_or_box() {
        let service = Arc::new(FakeService {
            matches: Some(vec![
                FaceMatch {
                    face_id: Some("face-1".to_string()),
                    similarity: 98.0,
                    bounding_box: None,
                },
                FaceMatch {
                    face_id: None,
                    similarity: 75.5,
                    bounding_box: Some(BoundingBox {
                        left: 0.1,
                        top: 0.2,
                        width: 0.3,
                        height: 0.4,
                    }),
                },
            ]),
            ..Default::default()
        });

        let batch = FaceCompareDetector::new(service, ImageReference::new("refs", "me.jpg"))
            .detect(&ImageReference::new("uploads", "new.jpg"))
            .await
            .unwrap();

        assert_eq!(batch.criteria()[0].name, "face-1");
        assert_eq!(batch.criteria()[0].points, 98.0);
        assert!(batch.criteria()[1].name.starts_with("box("));
        assert_eq!(batch.criteria()[1].points, 75.5);
    }
}
