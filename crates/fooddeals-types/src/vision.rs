//! Food classification and upload payloads.

use serde::{Deserialize, Serialize};

/// One ranked label from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Confidence; some server versions name it `score_percent`.
    #[serde(alias = "score_percent")]
    pub score: f64,
}

/// Classification of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    /// Per-file failure reported inside a batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }
}

/// Response of the batch and zip endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictions {
    #[serde(default)]
    pub results: Vec<PredictionResult>,
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}
