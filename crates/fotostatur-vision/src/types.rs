//! Classification service request/response types.

use serde::{Deserialize, Serialize};
use fotostatur_models::{FaceDetail, FaceMatch, ImageReference, Label, TextDetection};

/// Request for single-image endpoints (labels, text, face attributes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub image: ImageReference,
    /// Attribute groups to return; `["ALL"]` for face analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

impl ImageRequest {
    pub fn new(image: &ImageReference) -> Self {
        Self {
            image: image.clone(),
            attributes: Vec::new(),
        }
    }

    pub fn with_all_attributes(mut self) -> Self {
        self.attributes = vec!["ALL".to_string()];
        self
    }
}

/// Request for face comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareFacesRequest {
    /// Subject image
    pub source: ImageReference,
    /// Reference image the subject is compared against
    pub target: ImageReference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsResponse {
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    #[serde(default)]
    pub text_detections: Vec<TextDetection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareFacesResponse {
    #[serde(default)]
    pub face_matches: Vec<FaceMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAttributesResponse {
    #[serde(default)]
    pub face_details: Vec<FaceDetail>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
