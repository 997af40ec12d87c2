//! Calibration-quality metrics.
//!
//! [`CalibrationMetrics::evaluate`] computes ECE and Brier over a held-out
//! set of scores and binary labels. [`per_call_ece`] and [`per_call_brier`]
//! are the single-pair approximations reported when no held-out set is
//! attached; they are summary numbers for audit output, not real estimates.

use serde::{Deserialize, Serialize};

use crate::error::FitResult;
use crate::validate_pairs;

/// One populated bin of a reliability curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub bin: usize,
    /// Mean predicted score in the bin.
    pub confidence: f64,
    /// Fraction of positive labels in the bin.
    pub accuracy: f64,
    pub count: usize,
}

fn bin_index(score: f64, bins: usize) -> usize {
    ((score.clamp(0.0, 1.0) * bins as f64).floor() as usize).min(bins - 1)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Equal-width reliability curve; empty bins are omitted.
///
/// A score of exactly 1.0 falls in the last bin.
pub fn reliability_curve(scores: &[f64], labels: &[f64], bins: usize) -> FitResult<Vec<ReliabilityBin>> {
    Ok(raw_bins(scores, labels, bins)?
        .into_iter()
        .map(|b| ReliabilityBin {
            confidence: round3(b.confidence),
            accuracy: round3(b.accuracy),
            ..b
        })
        .collect())
}

fn raw_bins(scores: &[f64], labels: &[f64], bins: usize) -> FitResult<Vec<ReliabilityBin>> {
    validate_pairs(scores, labels, 1)?;
    let bins = bins.max(1);

    let mut sums = vec![(0.0, 0.0, 0usize); bins];
    for (s, l) in scores.iter().zip(labels) {
        let entry = &mut sums[bin_index(*s, bins)];
        entry.0 += s;
        entry.1 += l;
        entry.2 += 1;
    }

    Ok(sums
        .into_iter()
        .enumerate()
        .filter(|(_, (_, _, count))| *count > 0)
        .map(|(bin, (score_sum, label_sum, count))| ReliabilityBin {
            bin,
            confidence: score_sum / count as f64,
            accuracy: label_sum / count as f64,
            count,
        })
        .collect())
}

/// Metrics over a held-out calibration set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMetrics {
    pub ece: f64,
    pub brier_score: f64,
    pub samples: usize,
}

impl CalibrationMetrics {
    /// Weighted mean `|confidence - accuracy|` over bins, and mean squared error.
    pub fn evaluate(scores: &[f64], labels: &[f64], bins: usize) -> FitResult<Self> {
        let curve = raw_bins(scores, labels, bins)?;
        let n = scores.len() as f64;

        let ece = curve
            .iter()
            .map(|b| (b.count as f64 / n) * (b.confidence - b.accuracy).abs())
            .sum();
        let brier_score = scores
            .iter()
            .zip(labels)
            .map(|(s, l)| (s - l).powi(2))
            .sum::<f64>()
            / n;

        Ok(Self {
            ece,
            brier_score,
            samples: scores.len(),
        })
    }
}

/// Single-pair ECE approximation: a tenth of the calibration shift.
pub fn per_call_ece(raw: f64, calibrated: f64) -> f64 {
    (raw - calibrated).abs() * 0.1
}

/// Single-pair Brier approximation against a 0.5 target.
pub fn per_call_brier(calibrated: f64) -> f64 {
    (calibrated - 0.5).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfectly_calibrated_bins() {
        let scores = [0.05, 0.05, 0.95, 0.95];
        let labels = [0.0, 0.0, 1.0, 1.0];
        let metrics = CalibrationMetrics::evaluate(&scores, &labels, 10).unwrap();
        assert!((metrics.ece - 0.05).abs() < 1e-12);
        assert!((metrics.brier_score - 0.0025).abs() < 1e-12);
        assert_eq!(metrics.samples, 4);
    }

    #[test]
    fn test_reliability_curve_skips_empty_bins() {
        let scores = [0.12, 0.18, 0.55, 1.0];
        let labels = [0.0, 1.0, 1.0, 1.0];
        let curve = reliability_curve(&scores, &labels, 10).unwrap();
        let bins: Vec<usize> = curve.iter().map(|b| b.bin).collect();
        assert_eq!(bins, vec![1, 5, 9]);
        assert_eq!(curve[0].count, 2);
        assert_eq!(curve[0].accuracy, 0.5);
        assert_eq!(curve[0].confidence, 0.15);
    }

    #[test]
    fn test_per_call_formulas() {
        assert!((per_call_ece(0.8, 0.6) - 0.02).abs() < 1e-12);
        assert!((per_call_brier(0.9) - 0.16).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_rejects_empty_set() {
        assert!(CalibrationMetrics::evaluate(&[], &[], 10).is_err());
    }
}
