//! Domain-aware decision engine.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use riskgate_types::stats::round4;
use riskgate_types::{AbstainReason, Domain, RiskLevel, Verdict};

use crate::config::{DomainThresholds, InvalidThresholds, ThresholdConfig};

const MAX_LOG: usize = 1000;
const ABSTAIN_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub risk_level: RiskLevel,
    pub verdict: Verdict,
    pub confidence: f64,
    pub should_abstain: bool,
    pub abstain_reason: Option<AbstainReason>,
    /// Domain-adjusted score the bands were applied to.
    pub threshold_used: f64,
    /// Total offset applied, including the caution penalty.
    pub domain_adjustment: f64,
}

/// One entry of the decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub risk_level: RiskLevel,
    pub verdict: Verdict,
    pub confidence: f64,
    pub abstained: bool,
    pub domain: Domain,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStats {
    pub total: usize,
    pub abstained: usize,
    pub abstain_rate: f64,
    pub risk_distribution: BTreeMap<String, usize>,
    pub avg_confidence: f64,
}

/// Applies thresholds and records decisions.
///
/// Thresholds and the log sit behind separate locks; neither is held while
/// the other is taken.
#[derive(Debug)]
pub struct ConfidenceDecisionEngine {
    config: RwLock<ThresholdConfig>,
    log: Mutex<VecDeque<DecisionRecord>>,
}

impl ConfidenceDecisionEngine {
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            config: RwLock::new(config),
            log: Mutex::new(VecDeque::with_capacity(MAX_LOG)),
        }
    }

    pub fn config(&self) -> ThresholdConfig {
        self.config.read().clone()
    }

    /// Replace the thresholds used by later decisions.
    pub fn update_thresholds(&self, config: ThresholdConfig) -> Result<(), InvalidThresholds> {
        config.validate()?;
        info!(?config, "Decision thresholds updated");
        *self.config.write() = config;
        Ok(())
    }

    /// `(adjusted, adjustment)`. The caution penalty only pulls scores above
    /// 0.5 down.
    pub fn adjusted_score(&self, raw: f64, row: &DomainThresholds) -> (f64, f64) {
        let mut adjustment = row.score_adjustment;
        if row.extra_caution && raw > 0.5 {
            adjustment -= (raw - 0.5) * 0.1;
        }
        ((raw + adjustment).clamp(0.0, 1.0), adjustment)
    }

    fn abstain_reason(
        config: &ThresholdConfig,
        row: &DomainThresholds,
        uncertainty: f64,
        agreement: f64,
    ) -> Option<AbstainReason> {
        let weighted = uncertainty * row.uncertainty_weight;
        if weighted > config.uncertainty_abstain {
            return Some(AbstainReason::HighUncertainty {
                value: round4(weighted),
                threshold: config.uncertainty_abstain,
            });
        }

        let mut min_agreement = config.agreement_min;
        if row.require_higher_agreement {
            min_agreement += config.higher_agreement_margin;
        }
        if agreement < min_agreement {
            return Some(AbstainReason::LowAgreement {
                value: round4(agreement),
                threshold: round4(min_agreement),
            });
        }

        if row.extra_caution && uncertainty > config.caution_uncertainty {
            return Some(AbstainReason::DomainCaution {
                domain: row.domain,
                uncertainty: round4(uncertainty),
                threshold: config.caution_uncertainty,
            });
        }

        None
    }

    fn band(config: &ThresholdConfig, score: f64) -> RiskLevel {
        if score < config.no_risk_max {
            RiskLevel::NoRisk
        } else if score < config.low_risk_max {
            RiskLevel::LowRisk
        } else if score < config.medium_risk_max {
            RiskLevel::MediumRisk
        } else {
            RiskLevel::HighRisk
        }
    }

    fn verdict(level: RiskLevel, abstain: bool) -> Verdict {
        if abstain {
            return Verdict::Abstain;
        }
        match level {
            RiskLevel::HighRisk => Verdict::Fake,
            RiskLevel::NoRisk => Verdict::Real,
            _ => Verdict::Unverified,
        }
    }

    fn confidence(score: f64, uncertainty: f64, agreement: f64) -> f64 {
        let value = (1.0 - (0.5 - score).abs()) * 0.3 + (1.0 - uncertainty) * 0.3 + agreement * 0.4;
        round4(value.clamp(0.0, 1.0))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn decide(
        &self,
        calibrated_score: f64,
        uncertainty: f64,
        agreement: f64,
        domain: Domain,
    ) -> DecisionResult {
        let config = self.config();
        let row = config.domain(domain);

        let (adjusted, adjustment) = self.adjusted_score(calibrated_score, &row);
        let abstain_reason = Self::abstain_reason(&config, &row, uncertainty, agreement);
        let should_abstain = abstain_reason.is_some();

        let risk_level = if should_abstain {
            RiskLevel::HumanReview
        } else {
            Self::band(&config, adjusted)
        };
        let verdict = Self::verdict(risk_level, should_abstain);
        let confidence = if should_abstain {
            ABSTAIN_CONFIDENCE
        } else {
            Self::confidence(adjusted, uncertainty, agreement)
        };

        let result = DecisionResult {
            risk_level,
            verdict,
            confidence,
            should_abstain,
            abstain_reason,
            threshold_used: round4(adjusted),
            domain_adjustment: round4(adjustment),
        };

        self.record(&result, domain);
        debug!(%risk_level, %verdict, confidence, "Decision made");
        result
    }

    fn record(&self, result: &DecisionResult, domain: Domain) {
        let mut log = self.log.lock();
        log.push_back(DecisionRecord {
            risk_level: result.risk_level,
            verdict: result.verdict,
            confidence: result.confidence,
            abstained: result.should_abstain,
            domain,
            timestamp: Utc::now(),
        });
        while log.len() > MAX_LOG {
            log.pop_front();
        }
    }

    /// Rolling statistics over the decision log.
    pub fn decision_stats(&self) -> DecisionStats {
        let log = self.log.lock();
        let total = log.len();
        let abstained = log.iter().filter(|d| d.abstained).count();

        let mut risk_distribution = BTreeMap::new();
        for record in log.iter() {
            *risk_distribution
                .entry(record.risk_level.as_str().to_string())
                .or_insert(0) += 1;
        }

        let (abstain_rate, avg_confidence) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                round4(abstained as f64 / total as f64),
                round4(log.iter().map(|d| d.confidence).sum::<f64>() / total as f64),
            )
        };

        DecisionStats {
            total,
            abstained,
            abstain_rate,
            risk_distribution,
            avg_confidence,
        }
    }

    /// Most recent decisions, newest last.
    pub fn recent_decisions(&self, limit: usize) -> Vec<DecisionRecord> {
        let log = self.log.lock();
        let skip = log.len().saturating_sub(limit);
        log.iter().skip(skip).cloned().collect()
    }
}

impl Default for ConfidenceDecisionEngine {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}
