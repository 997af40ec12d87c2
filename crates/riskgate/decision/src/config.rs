//! Threshold configuration and the per-domain adjustment table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use riskgate_types::Domain;

/// Global thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_no_risk_max")]
    pub no_risk_max: f64,
    #[serde(default = "default_low_risk_max")]
    pub low_risk_max: f64,
    /// Scores at or above this are high risk.
    #[serde(default = "default_medium_risk_max")]
    pub medium_risk_max: f64,

    #[serde(default = "default_uncertainty_abstain")]
    pub uncertainty_abstain: f64,
    #[serde(default = "default_agreement_min")]
    pub agreement_min: f64,
    /// Added to `agreement_min` for domains requiring higher agreement.
    #[serde(default = "default_higher_agreement_margin")]
    pub higher_agreement_margin: f64,
    /// Raw uncertainty bound for extra-caution domains.
    #[serde(default = "default_caution_uncertainty")]
    pub caution_uncertainty: f64,

    /// Score offset subtracted for the political domain.
    #[serde(default = "default_political_fp_protection")]
    pub political_fp_protection: f64,
    /// Score offset subtracted for the defamation domain.
    #[serde(default = "default_defamation_caution")]
    pub defamation_caution: f64,
}

fn default_no_risk_max() -> f64 {
    0.15
}

fn default_low_risk_max() -> f64 {
    0.35
}

fn default_medium_risk_max() -> f64 {
    0.65
}

fn default_uncertainty_abstain() -> f64 {
    0.25
}

fn default_agreement_min() -> f64 {
    0.60
}

fn default_higher_agreement_margin() -> f64 {
    0.1
}

fn default_caution_uncertainty() -> f64 {
    0.15
}

fn default_political_fp_protection() -> f64 {
    0.10
}

fn default_defamation_caution() -> f64 {
    0.05
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            no_risk_max: default_no_risk_max(),
            low_risk_max: default_low_risk_max(),
            medium_risk_max: default_medium_risk_max(),
            uncertainty_abstain: default_uncertainty_abstain(),
            agreement_min: default_agreement_min(),
            higher_agreement_margin: default_higher_agreement_margin(),
            caution_uncertainty: default_caution_uncertainty(),
            political_fp_protection: default_political_fp_protection(),
            defamation_caution: default_defamation_caution(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid thresholds: {0}")]
pub struct InvalidThresholds(pub String);

impl ThresholdConfig {
    /// Band edges must be strictly increasing inside (0, 1].
    pub fn validate(&self) -> Result<(), InvalidThresholds> {
        let edges = [self.no_risk_max, self.low_risk_max, self.medium_risk_max];
        if edges[0] <= 0.0 || edges[2] > 1.0 || !edges.windows(2).all(|w| w[0] < w[1]) {
            return Err(InvalidThresholds(format!(
                "band edges must increase within (0, 1], got {:?}",
                edges
            )));
        }
        if !(0.0..=1.0).contains(&self.uncertainty_abstain) {
            return Err(InvalidThresholds(format!(
                "uncertainty_abstain out of range: {}",
                self.uncertainty_abstain
            )));
        }
        if !(0.0..=1.0).contains(&self.agreement_min) {
            return Err(InvalidThresholds(format!(
                "agreement_min out of range: {}",
                self.agreement_min
            )));
        }
        Ok(())
    }

    /// Adjustment row for a domain.
    pub fn domain(&self, domain: Domain) -> DomainThresholds {
        match domain {
            Domain::Political => DomainThresholds {
                domain,
                score_adjustment: -self.political_fp_protection,
                uncertainty_weight: 1.5,
                require_higher_agreement: true,
                extra_caution: true,
            },
            Domain::Defamation => DomainThresholds {
                domain,
                score_adjustment: -self.defamation_caution,
                uncertainty_weight: 1.3,
                require_higher_agreement: true,
                extra_caution: true,
            },
            Domain::Misinformation => DomainThresholds {
                domain,
                score_adjustment: 0.0,
                uncertainty_weight: 1.2,
                require_higher_agreement: false,
                extra_caution: false,
            },
            Domain::Impersonation => DomainThresholds {
                domain,
                score_adjustment: 0.05,
                uncertainty_weight: 1.0,
                require_higher_agreement: false,
                extra_caution: false,
            },
            Domain::General => DomainThresholds {
                domain,
                score_adjustment: 0.0,
                uncertainty_weight: 1.0,
                require_higher_agreement: false,
                extra_caution: false,
            },
        }
    }
}

/// Per-domain adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainThresholds {
    pub domain: Domain,
    pub score_adjustment: f64,
    pub uncertainty_weight: f64,
    pub require_higher_agreement: bool,
    pub extra_caution: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ThresholdConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let config = ThresholdConfig {
            low_risk_max: 0.7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_political_row_follows_config() {
        let config = ThresholdConfig {
            political_fp_protection: 0.2,
            ..Default::default()
        };
        let row = config.domain(Domain::Political);
        assert_eq!(row.score_adjustment, -0.2);
        assert!(row.extra_caution);
        assert_eq!(config.domain(Domain::Impersonation).score_adjustment, 0.05);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ThresholdConfig = serde_json::from_str(r#"{"agreement_min": 0.7}"#).unwrap();
        assert_eq!(config.agreement_min, 0.7);
        assert_eq!(config.no_risk_max, 0.15);
    }
}
