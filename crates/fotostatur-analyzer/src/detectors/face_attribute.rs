use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use fotostatur_models::{DetectorKind, ImageReference};
use fotostatur_vision::ClassificationService;
use tracing::debug;

use super::{findings_json, DetectionBatch, Detector};
use crate::error::DetectorError;

/// Facial attribute to score.
///
/// Parsed from `name` (score whatever the face reports) or `name!` (score
/// only when the attribute is present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub present_only: bool,
}

impl AttributeSelector {
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            present_only: false,
        }
    }

    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            present_only: true,
        }
    }

    /// Parse a comma-separated selector list, skipping blanks.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl Default for AttributeSelector {
    fn default() -> Self {
        Self::any("mustache")
    }
}

impl FromStr for AttributeSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, present_only) = match s.strip_suffix('!') {
            Some(name) => (name, true),
            None => (s, false),
        };
        let name = name.trim().to_lowercase();

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid face attribute selector '{}'", s));
        }

        Ok(Self { name, present_only })
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.present_only {
            write!(f, "{}!", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Scores selected attributes of every detected face.
///
/// Criterion names are `<attribute>:<present>`, e.g. `mustache:false`.
pub struct FaceAttributeDetector {
    service: Arc<dyn ClassificationService>,
    selectors: Vec<AttributeSelector>,
}

impl FaceAttributeDetector {
    pub fn new(service: Arc<dyn ClassificationService>, selectors: Vec<AttributeSelector>) -> Self {
        Self { service, selectors }
    }

    pub fn selectors(&self) -> &[AttributeSelector] {
        &self.selectors
    }
}

#[async_trait]
impl Detector for FaceAttributeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FaceAttribute
    }

    async fn detect(&self, image: &ImageReference) -> Result<DetectionBatch, DetectorError> {
        let faces = self.service.face_attributes(image).await?;
        debug!(
            image = %image,
            faces = faces.len(),
            findings = %findings_json(&faces),
            "Face attributes detected"
        );

        let mut batch = DetectionBatch::new(DetectorKind::FaceAttribute);
        for face in &faces {
            for selector in &self.selectors {
                let Some(attribute) = face.attribute(&selector.name) else {
                    continue;
                };
                if selector.present_only && !attribute.present {
                    continue;
                }
                batch.push(
                    format!("{}:{}", selector.name, attribute.present),
                    attribute.confidence,
                );
            }
        }

        Ok(batch)
    }
}
