//! The feedback loop.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use riskgate_ensemble::AdaptiveWeights;
use riskgate_types::stats::round4;
use riskgate_types::Domain;

use crate::config::FeedbackConfig;
use crate::error::{FeedbackError, FeedbackResult};
use crate::metrics::{
    DomainReport, ErrorPattern, ModelReport, OverallReport, PerformanceMetrics, PerformanceReport,
    ProblematicPatterns,
};
use crate::record::{FeedbackRecord, FeedbackSubmission, FeedbackType};

/// Submissions between threshold analyses.
const SUGGESTION_INTERVAL: u64 = 50;
/// Submissions between adaptive weight updates.
const WEIGHT_UPDATE_INTERVAL: u64 = 10;
const MIN_DOMAIN_SAMPLES: u64 = 20;
const RATE_THRESHOLD: f64 = 0.15;
const SUGGESTION_STEP: f64 = 0.05;
const MIN_RECOMMENDATION_SAMPLES: u64 = 50;

#[derive(Debug, Default)]
struct FeedbackState {
    records: VecDeque<FeedbackRecord>,
    overall: PerformanceMetrics,
    by_domain: BTreeMap<Domain, PerformanceMetrics>,
    by_model: BTreeMap<String, PerformanceMetrics>,
    suggestions: BTreeMap<Domain, f64>,
    submitted: u64,
}

impl FeedbackState {
    fn analyze(&mut self) {
        for (domain, metrics) in &self.by_domain {
            if metrics.total < MIN_DOMAIN_SAMPLES {
                continue;
            }
            let (fp_rate, fn_rate) = (metrics.fp_rate(), metrics.fn_rate());
            let adjustment = if fp_rate > RATE_THRESHOLD {
                -SUGGESTION_STEP * (fp_rate / RATE_THRESHOLD)
            } else if fn_rate > RATE_THRESHOLD {
                SUGGESTION_STEP * (fn_rate / RATE_THRESHOLD)
            } else {
                0.0
            };
            self.suggestions.insert(*domain, round4(adjustment));
        }
        debug!(suggestions = ?self.suggestions, "Threshold suggestions refreshed");
    }

    fn recommendations(&self) -> Vec<String> {
        let overall = &self.overall;
        if overall.total < MIN_RECOMMENDATION_SAMPLES {
            return vec!["Need more feedback data for reliable recommendations".to_string()];
        }

        let mut recommendations = Vec::new();
        if overall.fp_rate() > 0.1 {
            recommendations.push(format!(
                "High false positive rate ({:.1}%). Consider raising thresholds.",
                overall.fp_rate() * 100.0
            ));
        }
        if overall.fn_rate() > 0.1 {
            recommendations.push(format!(
                "High false negative rate ({:.1}%). Consider lowering thresholds.",
                overall.fn_rate() * 100.0
            ));
        }
        for (domain, metrics) in &self.by_domain {
            if metrics.total >= MIN_DOMAIN_SAMPLES && metrics.fp_rate() > RATE_THRESHOLD {
                recommendations.push(format!(
                    "Domain '{}' has high FP rate. Add domain-specific caution.",
                    domain
                ));
            }
        }

        let accuracy = overall.accuracy();
        recommendations.push(
            if accuracy > 0.9 {
                "Model performance is excellent. Continue monitoring."
            } else if accuracy > 0.8 {
                "Model performance is good. Minor tuning may help."
            } else {
                "Model performance needs improvement. Review training data."
            }
            .to_string(),
        );
        recommendations
    }

    fn error_pattern(&self, feedback_type: FeedbackType) -> ErrorPattern {
        let mut pattern = ErrorPattern::default();
        let mut score_sum = 0.0;
        for record in self.records.iter().filter(|r| r.feedback_type == feedback_type) {
            pattern.count += 1;
            score_sum += record.original_score;
            *pattern
                .by_domain
                .entry(record.domain.as_str().to_string())
                .or_insert(0) += 1;
        }
        if pattern.count > 0 {
            pattern.avg_score = round4(score_sum / pattern.count as f64);
        }
        pattern
    }
}

/// Collects corrections and drives adaptive weighting.
///
/// All counters sit behind one mutex. Weight outcomes are recorded while it
/// is held, so the ensemble sees outcomes in submission order and every
/// rebalance covers exactly the submissions counted so far. Lock order is
/// feedback state, then weights; the weights never call back.
pub struct FeedbackLoop {
    config: FeedbackConfig,
    state: Mutex<FeedbackState>,
    weights: Option<Arc<AdaptiveWeights>>,
}

impl FeedbackLoop {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            state: Mutex::new(FeedbackState::default()),
            weights: None,
        }
    }

    /// Feed model-signal outcomes into these ensemble weights.
    pub fn with_weights(mut self, weights: Arc<AdaptiveWeights>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Classify and record a correction.
    ///
    /// Every 50th submission refreshes the per-domain threshold suggestions;
    /// every 10th rebalances the ensemble weights.
    #[instrument(skip(self, submission), fields(scan_id = %submission.scan_id))]
    pub fn submit_correction(&self, submission: FeedbackSubmission) -> FeedbackResult<FeedbackRecord> {
        let score = submission.original_score;
        if !(0.0..=1.0).contains(&score) {
            return Err(FeedbackError::InvalidScore(score));
        }

        let record = FeedbackRecord::from_submission(submission);
        {
            let mut state = self.state.lock();

            state.overall.record(record.feedback_type);
            state
                .by_domain
                .entry(record.domain)
                .or_default()
                .record(record.feedback_type);
            for model in record.model_signals.keys() {
                state
                    .by_model
                    .entry(model.clone())
                    .or_default()
                    .record(record.feedback_type);
            }

            state.records.push_back(record.clone());
            while state.records.len() > self.config.max_history {
                state.records.pop_front();
            }

            state.submitted += 1;
            if state.submitted % SUGGESTION_INTERVAL == 0 {
                state.analyze();
            }

            if let Some(weights) = &self.weights {
                weights.record_outcome(&record.model_signals, record.corrected_label.is_risky());
                if state.submitted % WEIGHT_UPDATE_INTERVAL == 0 {
                    weights.rebalance();
                }
            }
        }

        info!(
            feedback_type = ?record.feedback_type,
            domain = %record.domain,
            "Feedback recorded"
        );
        Ok(record)
    }

    /// Metrics for one domain.
    pub fn domain_metrics(&self, domain: Domain) -> PerformanceMetrics {
        self.state
            .lock()
            .by_domain
            .get(&domain)
            .copied()
            .unwrap_or_default()
    }

    pub fn threshold_suggestion(&self, domain: Domain) -> Option<f64> {
        self.state.lock().suggestions.get(&domain).copied()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        let state = self.state.lock();
        PerformanceReport {
            overall: OverallReport::from(&state.overall),
            by_domain: state
                .by_domain
                .iter()
                .map(|(d, m)| (d.as_str().to_string(), DomainReport::from(m)))
                .collect(),
            by_model: state
                .by_model
                .iter()
                .map(|(name, m)| {
                    (
                        name.clone(),
                        ModelReport {
                            total: m.total,
                            accuracy: round4(m.accuracy()),
                        },
                    )
                })
                .collect(),
            threshold_suggestions: state
                .suggestions
                .iter()
                .map(|(d, s)| (d.as_str().to_string(), *s))
                .collect(),
            feedback_count: state.records.len(),
        }
    }

    /// Most recent records, newest last.
    pub fn recent_feedback(&self, limit: usize) -> Vec<FeedbackRecord> {
        let state = self.state.lock();
        let skip = state.records.len().saturating_sub(limit);
        state.records.iter().skip(skip).cloned().collect()
    }

    pub fn problematic_patterns(&self) -> ProblematicPatterns {
        let state = self.state.lock();
        ProblematicPatterns {
            false_positives: state.error_pattern(FeedbackType::FalsePositive),
            false_negatives: state.error_pattern(FeedbackType::FalseNegative),
            recommendations: state.recommendations(),
        }
    }
}

impl Default for FeedbackLoop {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_types::{RiskLevel, Verdict};

    fn correction(original: RiskLevel, corrected: RiskLevel, domain: Domain) -> FeedbackSubmission {
        FeedbackSubmission::new("scan", original, 0.8, corrected).with_domain(domain)
    }

    #[test]
    fn test_false_positive_counted_once() {
        let feedback = FeedbackLoop::default();
        let record = feedback
            .submit_correction(correction(RiskLevel::HighRisk, RiskLevel::NoRisk, Domain::Political))
            .unwrap();

        assert_eq!(record.feedback_type, FeedbackType::FalsePositive);
        let metrics = feedback.domain_metrics(Domain::Political);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.total, 1);
        assert_eq!(feedback.domain_metrics(Domain::General).total, 0);
    }

    #[test]
    fn test_invalid_score_rejected() {
        let feedback = FeedbackLoop::default();
        let submission = FeedbackSubmission::new("scan", RiskLevel::HighRisk, 1.5, RiskLevel::NoRisk);
        assert_eq!(
            feedback.submit_correction(submission),
            Err(FeedbackError::InvalidScore(1.5))
        );
        assert_eq!(feedback.performance_report().feedback_count, 0);
    }

    #[test]
    fn test_fifty_false_positives_suggest_lower_threshold() {
        let feedback = FeedbackLoop::default();
        for _ in 0..49 {
            feedback
                .submit_correction(correction(RiskLevel::HighRisk, RiskLevel::LowRisk, Domain::Defamation))
                .unwrap();
        }
        assert_eq!(feedback.threshold_suggestion(Domain::Defamation), None);

        feedback
            .submit_correction(correction(RiskLevel::HighRisk, RiskLevel::LowRisk, Domain::Defamation))
            .unwrap();
        // fp rate 1.0 -> -0.05 * (1.0 / 0.15)
        let suggestion = feedback.threshold_suggestion(Domain::Defamation).unwrap();
        assert!((suggestion + 0.3333).abs() < 1e-4);
    }

    #[test]
    fn test_small_domains_get_no_suggestion() {
        let feedback = FeedbackLoop::default();
        for i in 0..50 {
            let domain = if i < 45 { Domain::General } else { Domain::Impersonation };
            feedback
                .submit_correction(correction(RiskLevel::LowRisk, RiskLevel::LowRisk, domain))
                .unwrap();
        }
        assert_eq!(feedback.threshold_suggestion(Domain::General), Some(0.0));
        assert_eq!(feedback.threshold_suggestion(Domain::Impersonation), None);
    }

    #[test]
    fn test_history_is_bounded() {
        let feedback = FeedbackLoop::new(FeedbackConfig {
            max_history: 5,
            ..Default::default()
        });
        for i in 0..8 {
            feedback
                .submit_correction(FeedbackSubmission::new(
                    format!("scan-{}", i),
                    Verdict::Fake,
                    0.9,
                    Verdict::Fake,
                ))
                .unwrap();
        }
        let recent = feedback.recent_feedback(10);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].scan_id, "scan-3");
        assert_eq!(feedback.performance_report().overall.total_predictions, 8);
    }

    #[test]
    fn test_tenth_submission_rebalances_weights() {
        let weights = Arc::new(AdaptiveWeights::default());
        let feedback = FeedbackLoop::default().with_weights(weights.clone());
        let signals: BTreeMap<String, f64> =
            [("rules".to_string(), 0.9), ("linear".to_string(), 0.1)].into_iter().collect();

        for _ in 0..9 {
            feedback
                .submit_correction(
                    correction(RiskLevel::LowRisk, RiskLevel::HighRisk, Domain::General)
                        .with_signals(signals.clone()),
                )
                .unwrap();
        }
        assert_eq!(weights.snapshot().version, 0);

        feedback
            .submit_correction(
                correction(RiskLevel::LowRisk, RiskLevel::HighRisk, Domain::General)
                    .with_signals(signals),
            )
            .unwrap();
        let snapshot = weights.snapshot();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.get("rules") > 0.20);
    }

    #[test]
    fn test_concurrent_submissions_rebalance_in_step() {
        let weights = Arc::new(AdaptiveWeights::default());
        let feedback = FeedbackLoop::default().with_weights(weights.clone());
        let signals: BTreeMap<String, f64> = [("rules".to_string(), 0.9)].into_iter().collect();

        std::thread::scope(|scope| {
            for _ in 0..5 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        feedback
                            .submit_correction(
                                correction(RiskLevel::LowRisk, RiskLevel::HighRisk, Domain::General)
                                    .with_signals(signals.clone()),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let report = weights.report();
        assert_eq!(report.total_feedback, 50);
        assert_eq!(report.snapshot_version, 5);
        assert_eq!(report.models["rules"].total_samples, 50);
        assert_eq!(feedback.performance_report().feedback_count, 50);
    }

    #[test]
    fn test_problematic_patterns() {
        let feedback = FeedbackLoop::default();
        feedback
            .submit_correction(correction(RiskLevel::HighRisk, RiskLevel::NoRisk, Domain::Political))
            .unwrap();
        feedback
            .submit_correction(
                FeedbackSubmission::new("scan", RiskLevel::NoRisk, 0.1, RiskLevel::HighRisk)
                    .with_domain(Domain::Misinformation),
            )
            .unwrap();

        let patterns = feedback.problematic_patterns();
        assert_eq!(patterns.false_positives.count, 1);
        assert_eq!(patterns.false_positives.avg_score, 0.8);
        assert_eq!(patterns.false_negatives.by_domain["misinformation"], 1);
        assert_eq!(
            patterns.recommendations,
            vec!["Need more feedback data for reliable recommendations".to_string()]
        );
    }
}
