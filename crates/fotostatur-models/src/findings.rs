//! Findings returned by the classification service.
//!
//! Confidence and similarity values are on a 0-100 scale, as reported by
//! the service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Object or scene label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Label {
    pub name: String,
    pub confidence: f64,
}

/// Text fragment found in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextDetection {
    pub text: String,
    pub confidence: f64,
}

/// Face bounding box, in ratios of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "box(left={:.4}, top={:.4}, width={:.4}, height={:.4})",
            self.left, self.top, self.width, self.height
        )
    }
}

/// A face in the subject image that matched the reference face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_id: Option<String>,
    pub similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl FaceMatch {
    /// Identifier used to name the matched face: its id when the service
    /// reports one, otherwise its bounding box.
    pub fn identifier(&self) -> String {
        match (&self.face_id, &self.bounding_box) {
            (Some(id), _) => id.clone(),
            (None, Some(bounding_box)) => bounding_box.to_string(),
            (None, None) => "face".to_string(),
        }
    }
}

/// One facial attribute (beard, eyeglasses, mustache, smile, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceAttribute {
    /// Whether the attribute is present on the face
    pub present: bool,
    /// Confidence in `present`
    pub confidence: f64,
}

/// A detected face with its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// Attributes keyed by name; the service may capitalise them
    #[serde(default)]
    pub attributes: BTreeMap<String, FaceAttribute>,
}

impl FaceDetail {
    /// Look up an attribute by name, ignoring ASCII case.
    pub fn attribute(&self, name: &str) -> Option<&FaceAttribute> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, attribute)| attribute)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_match_identifier_prefers_id() {
        let bounding_box = BoundingBox {
            left: 0.1,
            top: 0.2,
            width: 0.3,
            height: 0.4,
        };
        let with_id = FaceMatch {
            face_id: Some("face-1".to_string()),
            similarity: 99.0,
            bounding_box: Some(bounding_box),
        };
        assert_eq!(with_id.identifier(), "face-1");

        let without_id = FaceMatch {
            face_id: None,
            similarity: 99.0,
            bounding_box: Some(bounding_box),
        };
        assert_eq!(
            without_id.identifier(),
            "box(left=0.1000, top=0.2000, width=0.3000, height=0.4000)"
        );
    }

    #[test]
    fn test_face_detail_deserialize_without_attributes() {
        let detail: FaceDetail = serde_json::from_str(r#"{"face_id": "f1"}"#).unwrap();
        assert_eq!(detail.face_id.as_deref(), Some("f1"));
        assert!(detail.attributes.is_empty());
        assert!(detail.attribute("mustache").is_none());
    }

    #[test]
    fn test_face_detail_attribute_lookup() {
        let detail: FaceDetail = serde_json::from_str(
            r#"{"attributes": {"mustache": {"present": false, "confidence": 93.5}}}"#,
        )
        .unwrap();
        let mustache = detail.attribute("mustache").unwrap();
        assert!(!mustache.present);
        assert_eq!(mustache.confidence, 93.5);
    }

    #[test]
    fn test_face_detail_attribute_lookup_ignores_case() {
        let detail: FaceDetail = serde_json::from_str(
            r#"{"attributes": {"Mustache": {"present": true, "confidence": 97.0}}}"#,
        )
        .unwrap();
        assert_eq!(detail.attribute("mustache").unwrap().confidence, 97.0);
        assert_eq!(detail.attribute("MUSTACHE").unwrap().confidence, 97.0);
        assert!(detail.attribute("beard").is_none());
    }
}
