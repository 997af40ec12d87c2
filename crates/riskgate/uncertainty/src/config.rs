//! Uncertainty configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyConfig {
    /// Combined uncertainty above which the pipeline abstains.
    #[serde(default = "default_abstain_threshold")]
    pub abstain_threshold: f64,

    /// Number of resampled scores for the epistemic estimate.
    #[serde(default = "default_mc_samples")]
    pub mc_samples: usize,

    /// Standard deviation of the resampling noise.
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f64,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_min_agreement")]
    pub min_agreement: f64,
}

fn default_abstain_threshold() -> f64 {
    0.25
}

fn default_mc_samples() -> usize {
    10
}

fn default_dropout_rate() -> f64 {
    0.1
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_min_agreement() -> f64 {
    0.6
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            abstain_threshold: default_abstain_threshold(),
            mc_samples: default_mc_samples(),
            dropout_rate: default_dropout_rate(),
            min_confidence: default_min_confidence(),
            min_agreement: default_min_agreement(),
        }
    }
}
