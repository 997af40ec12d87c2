//! Pipeline response payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use riskgate_calibration::CalibrationResult;
use riskgate_decision::DecisionResult;
use riskgate_ensemble::EnsembleResult;
use riskgate_quality::{IssueCode, QualityReport};
use riskgate_types::stats::round4;
use riskgate_types::{Domain, RiskLevel, Signal, Verdict};
use riskgate_uncertainty::UncertaintyResult;

/// Ensemble summary without per-member features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleDetails {
    /// Average of the ensemble score and the domain classifier score.
    pub raw_score: f64,
    pub ensemble_score: f64,
    pub agreement: f64,
    pub signals: BTreeMap<String, f64>,
    pub weights_used: BTreeMap<String, f64>,
    pub contributions: BTreeMap<String, f64>,
    pub semantic_boost: f64,
    pub semantic_pattern: String,
    pub disagreement_level: f64,
    pub needs_review: bool,
}

impl EnsembleDetails {
    pub fn new(result: &EnsembleResult, raw_score: f64, contributions: BTreeMap<String, f64>) -> Self {
        Self {
            raw_score: round4(raw_score),
            ensemble_score: result.raw_score,
            agreement: result.agreement,
            signals: result.signals.clone(),
            weights_used: result.weights_used.clone(),
            contributions,
            semantic_boost: result.semantic_boost,
            semantic_pattern: result.semantic_pattern.clone(),
            disagreement_level: result.disagreement_level,
            needs_review: result.needs_review,
        }
    }
}

/// Quality gate outcome as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityInfo {
    pub score: f64,
    pub usable: bool,
    pub issues_found: Vec<IssueCode>,
    pub content_hash: String,
}

impl From<&QualityReport> for DataQualityInfo {
    fn from(report: &QualityReport) -> Self {
        Self {
            score: report.score,
            usable: report.usable,
            issues_found: report.issue_codes(),
            content_hash: report.metadata.content_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceFlags {
    /// The political classifier scored above 0.5.
    pub political_risk_detected: bool,
    pub sensitive_content_score: f64,
}

/// Full result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub scan_id: Uuid,
    pub domain: Domain,
    pub prediction: RiskLevel,
    pub verdict: Verdict,
    pub confidence: f64,
    pub calibrated_score: f64,
    pub risk_score_percent: f64,
    pub model_version: String,
    pub inference_time_ms: f64,
    pub ensemble: EnsembleDetails,
    pub calibration: CalibrationResult,
    pub uncertainty: UncertaintyResult,
    pub decision: DecisionResult,
    pub data_quality: DataQualityInfo,
    pub critical_terms: Vec<String>,
    pub governance_flags: GovernanceFlags,
    pub model_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    /// Whether the pipeline deferred to a human reviewer.
    pub fn abstained(&self) -> bool {
        self.prediction == RiskLevel::HumanReview
    }
}

const MAX_CRITICAL_TERMS: usize = 10;

/// Strong collaborator signals, or the first long words when there are none.
pub fn critical_terms(text: &str, signals: &[Signal]) -> Vec<String> {
    let strong: Vec<String> = signals
        .iter()
        .filter(|s| s.weight > 0.5)
        .map(|s| s.term.clone())
        .take(MAX_CRITICAL_TERMS)
        .collect();
    if !strong.is_empty() {
        return strong;
    }
    text.split_whitespace()
        .take(5)
        .filter(|word| word.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(term: &str, weight: f64) -> Signal {
        Signal {
            term: term.to_string(),
            weight,
            position: 0,
            context: String::new(),
        }
    }

    #[test]
    fn test_critical_terms_prefer_strong_signals() {
        let signals = vec![signal("propina", 0.9), signal("cargo", 0.25)];
        assert_eq!(critical_terms("texto qualquer", &signals), vec!["propina"]);
    }

    #[test]
    fn test_critical_terms_fallback_to_long_words() {
        let terms = critical_terms("o dia de sol foi muito bonito hoje", &[signal("cargo", 0.25)]);
        assert!(terms.is_empty());

        let terms = critical_terms("Reunião ordinária da câmara municipal de hoje", &[]);
        assert_eq!(terms, vec!["Reunião", "ordinária", "câmara", "municipal"]);
    }
}
