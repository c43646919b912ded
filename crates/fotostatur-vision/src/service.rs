//! Classification capability consumed by the detectors.

use async_trait::async_trait;
use fotostatur_models::{FaceDetail, FaceMatch, ImageReference, Label, TextDetection};

use crate::error::VisionResult;

/// Remote image classification.
///
/// Each method is one request/response. Retries and timeouts are the
/// implementation's concern.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Object and scene labels.
    async fn labels(&self, image: &ImageReference) -> VisionResult<Vec<Label>>;

    /// Text fragments found in the image.
    async fn text(&self, image: &ImageReference) -> VisionResult<Vec<TextDetection>>;

    /// Faces in `source` that match the face in `target`.
    async fn compare_faces(
        &self,
        target: &ImageReference,
        source: &ImageReference,
    ) -> VisionResult<Vec<FaceMatch>>;

    /// Every detected face with all of its attributes.
    async fn face_attributes(&self, image: &ImageReference) -> VisionResult<Vec<FaceDetail>>;
}
