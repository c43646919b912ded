//! Scored criteria and decisions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of detector that produced a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Object and scene labels
    Label,
    /// Text found in the image
    Text,
    /// Similarity against the reference headshot
    FaceCompare,
    /// Facial attributes
    FaceAttribute,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Label => "label",
            DetectorKind::Text => "text",
            DetectorKind::FaceCompare => "face_compare",
            DetectorKind::FaceAttribute => "face_attribute",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored finding.
///
/// `points` is the confidence or similarity reported by the classification
/// service on a 0-100 scale. It is not range-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Criterion {
    /// What was matched (label, detected text, face identifier, attribute)
    pub name: String,
    /// Confidence or similarity, 0-100
    pub points: f64,
    /// Detector that produced this criterion
    pub source: DetectorKind,
}

impl Criterion {
    pub fn new(name: impl Into<String>, points: f64, source: DetectorKind) -> Self {
        Self {
            name: name.into(),
            points,
            source,
        }
    }
}

/// Outcome of comparing the final score with the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Accept iff a score exists and is strictly above the threshold.
    pub fn from_score(score: Option<f64>, threshold: f64) -> Self {
        match score {
            Some(score) if score > threshold => Decision::Accept,
            _ => Decision::Reject,
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
