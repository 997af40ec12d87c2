//! Quality gate configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`DataQualityGate`](crate::DataQualityGate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Any issue at all makes a sample unusable.
    #[serde(default)]
    pub strict_mode: bool,

    /// Minimum overall score for a usable sample.
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,

    /// Shortest accepted text, in characters.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Longest accepted text, in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Entries kept in the duplicate-content set before eviction.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            min_quality_score: default_min_quality_score(),
            min_text_length: default_min_text_length(),
            max_text_length: default_max_text_length(),
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

impl QualityConfig {
    /// Strict variant of the defaults.
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }
}

fn default_min_quality_score() -> f64 {
    0.6
}

fn default_min_text_length() -> usize {
    10
}

fn default_max_text_length() -> usize {
    50_000
}

fn default_dedup_capacity() -> usize {
    10_000
}
