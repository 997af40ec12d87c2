//! Performance counters and report types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riskgate_types::stats::round4;

use crate::record::FeedbackType;

/// Counts of feedback outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total: u64,
    pub correct: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub overrides: u64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl PerformanceMetrics {
    pub fn record(&mut self, feedback_type: FeedbackType) {
        self.total += 1;
        match feedback_type {
            FeedbackType::Correct => self.correct += 1,
            FeedbackType::FalsePositive => self.false_positives += 1,
            FeedbackType::FalseNegative => self.false_negatives += 1,
            FeedbackType::Override => self.overrides += 1,
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Confirmed predictions over confirmed plus false alarms.
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.correct + self.false_positives)
    }

    /// Confirmed predictions over confirmed plus misses.
    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.correct + self.false_negatives)
    }

    pub fn f1_score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn fp_rate(&self) -> f64 {
        ratio(self.false_positives, self.total)
    }

    pub fn fn_rate(&self) -> f64 {
        ratio(self.false_negatives, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallReport {
    pub total_predictions: u64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub false_positive_count: u64,
    pub false_negative_count: u64,
    pub override_count: u64,
}

impl From<&PerformanceMetrics> for OverallReport {
    fn from(m: &PerformanceMetrics) -> Self {
        Self {
            total_predictions: m.total,
            accuracy: round4(m.accuracy()),
            precision: round4(m.precision()),
            recall: round4(m.recall()),
            f1_score: round4(m.f1_score()),
            false_positive_count: m.false_positives,
            false_negative_count: m.false_negatives,
            override_count: m.overrides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    pub total: u64,
    pub accuracy: f64,
    pub fp_rate: f64,
    pub fn_rate: f64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl From<&PerformanceMetrics> for DomainReport {
    fn from(m: &PerformanceMetrics) -> Self {
        Self {
            total: m.total,
            accuracy: round4(m.accuracy()),
            fp_rate: round4(m.fp_rate()),
            fn_rate: round4(m.fn_rate()),
            false_positives: m.false_positives,
            false_negatives: m.false_negatives,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub total: u64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub overall: OverallReport,
    pub by_domain: BTreeMap<String, DomainReport>,
    pub by_model: BTreeMap<String, ModelReport>,
    /// Suggested threshold offsets per domain; negative lowers the threshold.
    pub threshold_suggestions: BTreeMap<String, f64>,
    pub feedback_count: usize,
}

/// Summary of one kind of error across the history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub count: usize,
    pub avg_score: f64,
    pub by_domain: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblematicPatterns {
    pub false_positives: ErrorPattern,
    pub false_negatives: ErrorPattern,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = PerformanceMetrics::default();
        assert_eq!(m.accuracy(), 0.0);
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.f1_score(), 0.0);
    }

    #[test]
    fn test_derived_rates() {
        let mut m = PerformanceMetrics::default();
        for t in [
            FeedbackType::Correct,
            FeedbackType::Correct,
            FeedbackType::Correct,
            FeedbackType::FalsePositive,
            FeedbackType::FalseNegative,
            FeedbackType::Override,
        ] {
            m.record(t);
        }
        assert_eq!(m.total, 6);
        assert!((m.accuracy() - 0.5).abs() < 1e-12);
        assert!((m.precision() - 0.75).abs() < 1e-12);
        assert!((m.recall() - 0.75).abs() < 1e-12);
        assert!((m.f1_score() - 0.75).abs() < 1e-12);
    }
}
