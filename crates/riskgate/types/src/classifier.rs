//! Contract for the external domain classifiers.
//!
//! The pipeline treats classifiers as black boxes: it reads the score,
//! confidence, and signals, and never inspects pattern logic.

use serde::{Deserialize, Serialize};

/// A term that contributed to a classifier score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub term: String,
    pub weight: f64,
    /// Character offset of the match.
    pub position: usize,
    pub context: String,
}

/// Result of scoring a text with a domain classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub score: f64,
    pub confidence: f64,
    pub signals: Vec<Signal>,
    pub model_version: String,
    pub model_hash: String,
}

/// Stateless text scorer for one domain.
pub trait DomainClassifier: Send + Sync {
    /// Model name used in audit output.
    fn name(&self) -> &str;

    /// Score a text. Score and confidence must be in [0, 1].
    fn score(&self, text: &str) -> ClassifierOutput;
}
