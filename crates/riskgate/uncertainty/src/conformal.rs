//! Split-conformal prediction sets over the risk bands.

use serde::{Deserialize, Serialize};

use riskgate_types::stats::round4;
use riskgate_types::RiskLevel;

use crate::quantifier::{point_label, UncertaintyQuantifier};

/// Risk bands `(label, low, high)` in reporting order.
const BANDS: [(RiskLevel, f64, f64); 4] = [
    (RiskLevel::HighRisk, 0.7, 1.0),
    (RiskLevel::MediumRisk, 0.4, 0.7),
    (RiskLevel::LowRisk, 0.15, 0.4),
    (RiskLevel::NoRisk, 0.0, 0.15),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformalResult {
    /// Labels whose band centre lies within `threshold` of the score.
    pub prediction_set: Vec<RiskLevel>,
    /// Target coverage `1 - alpha`.
    pub coverage: f64,
    /// Conformal quantile; `None` when no calibration scores were given.
    pub threshold: Option<f64>,
}

impl UncertaintyQuantifier {
    /// Prediction set for `score` given nonconformity scores from a
    /// calibration set and a miscoverage rate `alpha`.
    ///
    /// The half-width is the `ceil((n + 1)(1 - alpha))`-th smallest
    /// calibration score, clamped to the available range. An empty
    /// calibration set, or a set that would contain no label, yields the
    /// point label alone.
    pub fn conformal_prediction(&self, score: f64, calibration_scores: &[f64], alpha: f64) -> ConformalResult {
        let alpha = alpha.clamp(0.0, 1.0);
        let coverage = (1.0 - alpha) * 100.0;
        let coverage = coverage.round() / 100.0;

        if calibration_scores.is_empty() {
            return ConformalResult {
                prediction_set: vec![point_label(score)],
                coverage,
                threshold: None,
            };
        }

        let mut sorted = calibration_scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        let rank = ((n as f64 + 1.0) * (1.0 - alpha)).ceil() as i64 - 1;
        let index = rank.clamp(0, n as i64 - 1) as usize;
        let threshold = sorted[index];

        let mut prediction_set: Vec<RiskLevel> = BANDS
            .iter()
            .filter(|(_, low, high)| (score - (low + high) / 2.0).abs() <= threshold)
            .map(|(label, _, _)| *label)
            .collect();
        if prediction_set.is_empty() {
            prediction_set.push(point_label(score));
        }

        ConformalResult {
            prediction_set,
            coverage,
            threshold: Some(round4(threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_calibration_set_is_singleton() {
        let q = UncertaintyQuantifier::default();
        let result = q.conformal_prediction(0.8, &[], 0.1);
        assert_eq!(result.prediction_set, vec![RiskLevel::HighRisk]);
        assert_eq!(result.coverage, 0.9);
        assert_eq!(result.threshold, None);
    }

    #[test]
    fn test_wide_threshold_admits_neighbouring_bands() {
        let q = UncertaintyQuantifier::default();
        let calibration: Vec<f64> = (1..=9).map(|i| i as f64 * 0.05).collect();
        // n = 9, alpha = 0.1: rank ceil(10 * 0.9) - 1 = 8, the largest score
        let result = q.conformal_prediction(0.55, &calibration, 0.1);
        assert_eq!(result.threshold, Some(0.45));
        assert!(result.prediction_set.contains(&RiskLevel::MediumRisk));
        assert!(result.prediction_set.contains(&RiskLevel::HighRisk));
        assert!(result.prediction_set.contains(&RiskLevel::LowRisk));
    }

    #[test]
    fn test_tight_threshold_falls_back_to_point_label() {
        let q = UncertaintyQuantifier::default();
        let result = q.conformal_prediction(0.7, &[0.01, 0.01, 0.01], 0.1);
        assert_eq!(result.prediction_set, vec![RiskLevel::HighRisk]);
        assert_eq!(result.threshold, Some(0.01));
    }
}
