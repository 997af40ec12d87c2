//! Per-model prediction produced by an ensemble member.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output of one ensemble member for one request. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model_name: String,
    /// Risk score in [0, 1].
    pub score: f64,
    /// Member confidence in [0, 1].
    pub confidence: f64,
    /// Named features the member derived from the text.
    pub features: BTreeMap<String, f64>,
}

impl ModelPrediction {
    /// Create a prediction, clamping score and confidence into [0, 1].
    pub fn new(model_name: impl Into<String>, score: f64, confidence: f64) -> Self {
        Self {
            model_name: model_name.into(),
            score: crate::stats::clamp_unit(score),
            confidence: crate::stats::clamp_unit(confidence),
            features: BTreeMap::new(),
        }
    }

    /// Attach derived features.
    pub fn with_features(mut self, features: BTreeMap<String, f64>) -> Self {
        self.features = features;
        self
    }
}
