//! Uncertainty quantifier.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use riskgate_types::stats::{clamp_unit, mean, population_std, round4, spread};
use riskgate_types::{AbstainReason, RiskLevel};

use crate::config::UncertaintyConfig;

/// Point label for a score, by the quantifier's own bands.
pub fn point_label(score: f64) -> RiskLevel {
    if score < 0.15 {
        RiskLevel::NoRisk
    } else if score < 0.4 {
        RiskLevel::LowRisk
    } else if score < 0.7 {
        RiskLevel::MediumRisk
    } else {
        RiskLevel::HighRisk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyResult {
    /// Point label, or `HUMAN_REVIEW` when abstaining.
    pub prediction_label: RiskLevel,
    pub confidence: f64,
    pub uncertainty: f64,
    pub epistemic: f64,
    pub aleatoric: f64,
    pub agreement: f64,
    pub abstain: bool,
    pub abstain_reason: Option<AbstainReason>,
}

/// Stateless; safe to share across requests.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyQuantifier {
    config: UncertaintyConfig,
}

impl UncertaintyQuantifier {
    pub fn new(config: UncertaintyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Resample `score` under Gaussian noise: `(mean, epistemic)`.
    ///
    /// The generator is seeded from `score * 1000`, so the result is a pure
    /// function of the score.
    pub fn monte_carlo_dropout(&self, score: f64) -> (f64, f64) {
        let n = self.config.mc_samples.max(1);
        let mut rng = StdRng::seed_from_u64((clamp_unit(score) * 1000.0) as u64);

        let samples: Vec<f64> = (0..n)
            .map(|_| clamp_unit(score + self.config.dropout_rate * standard_normal(&mut rng)))
            .collect();

        (mean(&samples), population_std(&samples))
    }

    /// Step function of confidence, rising linearly below 0.7.
    pub fn aleatoric_uncertainty(&self, confidence: f64) -> f64 {
        if confidence >= 0.95 {
            0.02
        } else if confidence >= 0.85 {
            0.05
        } else if confidence >= 0.7 {
            0.1
        } else {
            0.15 + (0.7 - confidence) * 0.3
        }
    }

    /// First failing abstention condition, checked in order.
    pub fn abstain_reason(&self, uncertainty: f64, confidence: f64, agreement: f64) -> Option<AbstainReason> {
        if uncertainty > self.config.abstain_threshold {
            return Some(AbstainReason::HighUncertainty {
                value: round4(uncertainty),
                threshold: self.config.abstain_threshold,
            });
        }
        if confidence < self.config.min_confidence {
            return Some(AbstainReason::LowConfidence {
                value: round4(confidence),
                threshold: self.config.min_confidence,
            });
        }
        if agreement < self.config.min_agreement {
            return Some(AbstainReason::LowAgreement {
                value: round4(agreement),
                threshold: self.config.min_agreement,
            });
        }
        None
    }

    /// Combine epistemic, aleatoric and (when given) inter-model uncertainty.
    ///
    /// `member_scores` are the individual ensemble member scores; with two or
    /// more of them, their standard deviation is blended into the total and
    /// agreement becomes `1 - (max - min)`.
    #[instrument(skip(self, member_scores), fields(members = member_scores.len()))]
    pub fn quantify(&self, score: f64, confidence: f64, member_scores: &[f64]) -> UncertaintyResult {
        let (_, epistemic) = self.monte_carlo_dropout(score);
        let aleatoric = self.aleatoric_uncertainty(confidence);

        let mut total = (epistemic.powi(2) + aleatoric.powi(2)).sqrt().min(1.0);
        if !member_scores.is_empty() {
            total = (total + population_std(member_scores)) / 2.0;
        }

        let agreement = if member_scores.len() > 1 {
            1.0 - spread(member_scores)
        } else {
            1.0 - total
        };

        let abstain_reason = self.abstain_reason(total, confidence, agreement);
        let abstain = abstain_reason.is_some();
        let prediction_label = if abstain {
            RiskLevel::HumanReview
        } else {
            point_label(score)
        };

        debug!(
            uncertainty = total,
            epistemic,
            aleatoric,
            abstain,
            "Uncertainty quantified"
        );

        UncertaintyResult {
            prediction_label,
            confidence: round4(confidence),
            uncertainty: round4(total),
            epistemic: round4(epistemic),
            aleatoric: round4(aleatoric),
            agreement: round4(agreement),
            abstain,
            abstain_reason,
        }
    }
}

/// Box-Muller draw from N(0, 1).
fn standard_normal(rng: &mut StdRng) -> f64 {
    // gen::<f64>() is in [0, 1); shift to (0, 1] so ln is finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aleatoric_steps() {
        let q = UncertaintyQuantifier::default();
        assert_eq!(q.aleatoric_uncertainty(0.97), 0.02);
        assert_eq!(q.aleatoric_uncertainty(0.9), 0.05);
        assert_eq!(q.aleatoric_uncertainty(0.75), 0.1);
        assert!((q.aleatoric_uncertainty(0.5) - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_epistemic_is_bounded_noise() {
        let q = UncertaintyQuantifier::default();
        let (m, epistemic) = q.monte_carlo_dropout(0.5);
        assert!(epistemic > 0.0 && epistemic < 0.3);
        assert!((m - 0.5).abs() < 0.15);
    }

    #[test]
    fn test_confident_agreeing_members_do_not_abstain() {
        let q = UncertaintyQuantifier::default();
        let result = q.quantify(0.05, 0.9, &[0.05, 0.06, 0.04]);
        assert!(!result.abstain, "{:?}", result.abstain_reason);
        assert_eq!(result.prediction_label, RiskLevel::NoRisk);
    }

    #[test]
    fn test_low_confidence_abstains() {
        let q = UncertaintyQuantifier::default();
        let result = q.quantify(0.8, 0.55, &[0.8, 0.8]);
        assert!(result.abstain);
        assert_eq!(result.prediction_label, RiskLevel::HumanReview);
        assert!(matches!(
            result.abstain_reason,
            Some(AbstainReason::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_spread_members_abstain_on_agreement() {
        let q = UncertaintyQuantifier::default();
        let result = q.quantify(0.5, 0.97, &[0.1, 0.2, 0.6]);
        assert!(result.abstain);
        assert!((result.agreement - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_point_label_bands() {
        assert_eq!(point_label(0.0), RiskLevel::NoRisk);
        assert_eq!(point_label(0.15), RiskLevel::LowRisk);
        assert_eq!(point_label(0.4), RiskLevel::MediumRisk);
        assert_eq!(point_label(0.7), RiskLevel::HighRisk);
        assert_eq!(point_label(1.0), RiskLevel::HighRisk);
    }

    proptest! {
        #[test]
        fn prop_epistemic_is_deterministic(score in 0.0f64..=1.0, confidence in 0.0f64..=1.0) {
            let q = UncertaintyQuantifier::default();
            let first = q.quantify(score, confidence, &[]);
            let second = q.quantify(score, confidence, &[]);
            prop_assert_eq!(first.epistemic, second.epistemic);
            prop_assert_eq!(first.uncertainty, second.uncertainty);
            prop_assert!((0.0..=1.0).contains(&first.uncertainty));
        }
    }
}
