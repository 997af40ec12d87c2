//! The risk-decision pipeline.
//!
//! Breaker gate, then quality gate, ensemble and domain classifier under
//! the bounded executor, then calibration, uncertainty and decision. A
//! panic in any stage surfaces as a service error and counts against the
//! breaker. Stage work handed to the executor owns `Arc` clones of
//! everything it touches, so an abandoned stage holds no borrowed state and
//! no locks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use riskgate_calibration::{CalibrationResult, Calibrator};
use riskgate_decision::{ConfidenceDecisionEngine, DecisionResult, DecisionStats};
use riskgate_ensemble::{AdaptiveWeights, EnsembleCoordinator, WeightReport};
use riskgate_feedback::{
    FeedbackLoop, FeedbackRecord, FeedbackResult, FeedbackSender, FeedbackSubmission,
    FeedbackWorker, PerformanceReport,
};
use riskgate_quality::DataQualityGate;
use riskgate_resilience::{BoundedExecutor, CircuitBreaker, CircuitBreakerStats};
use riskgate_types::stats::round4;
use riskgate_types::{Domain, RiskLevel, TextSample, Verdict};
use riskgate_uncertainty::{UncertaintyQuantifier, UncertaintyResult};

use crate::assessment::{critical_terms, DataQualityInfo, EnsembleDetails, GovernanceFlags, RiskAssessment};
use crate::builder::RiskPipelineBuilder;
use crate::classifiers::ClassifierSet;
use crate::config::RiskGateConfig;
use crate::error::{PipelineError, PipelineResult};

const POLITICAL_FLAG_THRESHOLD: f64 = 0.5;

/// Explicitly constructed pipeline; share it behind an `Arc`.
pub struct RiskPipeline {
    pub(crate) config: RiskGateConfig,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) executor: BoundedExecutor,
    pub(crate) gate: Arc<DataQualityGate>,
    pub(crate) ensemble: Arc<EnsembleCoordinator>,
    pub(crate) classifiers: ClassifierSet,
    pub(crate) calibrator: Calibrator,
    pub(crate) uncertainty: UncertaintyQuantifier,
    pub(crate) decisions: ConfidenceDecisionEngine,
    pub(crate) feedback: Arc<FeedbackLoop>,
}

impl RiskPipeline {
    pub fn builder(config: RiskGateConfig) -> RiskPipelineBuilder {
        RiskPipelineBuilder::new(config)
    }

    /// Pipeline with every default component.
    pub fn from_config(config: RiskGateConfig) -> PipelineResult<Self> {
        RiskPipelineBuilder::new(config).build()
    }

    pub fn config(&self) -> &RiskGateConfig {
        &self.config
    }

    /// Evaluate a sample under its own domain hint.
    ///
    /// Only a completed run resets the breaker. Every failure except an open
    /// breaker is recorded against it.
    #[instrument(skip(self, sample), fields(domain = %sample.domain()))]
    pub async fn evaluate(&self, sample: TextSample) -> PipelineResult<RiskAssessment> {
        if !self.breaker.can_execute() {
            let retry_after_secs = self
                .breaker
                .retry_after()
                .map_or(0.0, |remaining| remaining.as_secs_f64());
            warn!(retry_after_secs, "Rejecting request, circuit breaker open");
            return Err(PipelineError::CircuitOpen { retry_after_secs });
        }

        let outcome = self.run_stages(sample).await;
        match &outcome {
            Ok(assessment) => {
                self.breaker.record_success();
                info!(
                    scan_id = %assessment.scan_id,
                    prediction = %assessment.prediction,
                    calibrated_score = assessment.calibrated_score,
                    inference_time_ms = assessment.inference_time_ms,
                    "Evaluation completed"
                );
            }
            Err(err) if err.counts_as_breaker_failure() => {
                self.breaker.record_failure();
                warn!(code = err.code(), error = %err, "Evaluation failed");
            }
            Err(_) => {}
        }
        outcome
    }

    /// Evaluate `text` under `domain`.
    pub async fn evaluate_text(&self, text: &str, domain: Domain) -> PipelineResult<RiskAssessment> {
        self.evaluate(TextSample::new(text).with_domain(domain)).await
    }

    pub async fn evaluate_political(&self, text: &str) -> PipelineResult<RiskAssessment> {
        self.evaluate_text(text, Domain::Political).await
    }

    pub async fn evaluate_defamation(&self, text: &str) -> PipelineResult<RiskAssessment> {
        self.evaluate_text(text, Domain::Defamation).await
    }

    pub async fn evaluate_misinformation(&self, text: &str) -> PipelineResult<RiskAssessment> {
        self.evaluate_text(text, Domain::Misinformation).await
    }

    pub async fn evaluate_impersonation(&self, text: &str) -> PipelineResult<RiskAssessment> {
        self.evaluate_text(text, Domain::Impersonation).await
    }

    async fn run_stages(&self, sample: TextSample) -> PipelineResult<RiskAssessment> {
        let started = Instant::now();
        let scan_id = Uuid::new_v4();
        let sample = sample.truncated(self.config.inference.max_text_length);
        let domain = sample.domain();
        let domain_hint = sample.domain_hint();
        let text: Arc<str> = Arc::from(sample.text());

        let gate = Arc::clone(&self.gate);
        let gate_text = Arc::clone(&text);
        let quality = self
            .executor
            .run("quality", move || gate.validate(&gate_text))
            .await?;
        if !quality.usable {
            debug!(%scan_id, score = quality.score, "Sample rejected by quality gate");
            return Err(PipelineError::DataQuality {
                score: quality.score,
                issues: quality.issue_codes(),
            });
        }

        let ensemble = Arc::clone(&self.ensemble);
        let ensemble_text = Arc::clone(&text);
        let ensemble_result = self
            .executor
            .run("ensemble", move || ensemble.predict(&ensemble_text, domain_hint))
            .await?;

        let domain_classifier = Arc::clone(self.classifiers.for_domain(domain));
        let political_classifier = Arc::clone(self.classifiers.for_domain(Domain::Political));
        let classifier_text = Arc::clone(&text);
        let (domain_output, political_score) = self
            .executor
            .run("classifier", move || {
                let output = domain_classifier.score(&classifier_text);
                let political = if domain == Domain::Political {
                    output.score
                } else {
                    political_classifier.score(&classifier_text).score
                };
                (output, political)
            })
            .await?;

        let raw_score = (ensemble_result.raw_score + domain_output.score) / 2.0;
        let member_scores = ensemble_result.member_scores();
        let (calibration, uncertainty, decision) = panic::catch_unwind(AssertUnwindSafe(|| {
            self.score_stages(
                raw_score,
                domain_output.confidence,
                &member_scores,
                ensemble_result.agreement,
                domain,
            )
        }))
        .map_err(|_| PipelineError::Service("scoring stage panicked".to_string()))?;
        let calibrated = calibration.calibrated_score;

        let (prediction, verdict, confidence) = if uncertainty.abstain {
            (RiskLevel::HumanReview, Verdict::Abstain, decision.confidence.min(0.5))
        } else {
            (decision.risk_level, decision.verdict, decision.confidence)
        };

        let political_risk_detected = political_score > POLITICAL_FLAG_THRESHOLD;
        let mut sensitive_content_score = if political_risk_detected {
            political_score
        } else {
            0.0
        };
        if domain == Domain::Defamation {
            sensitive_content_score = sensitive_content_score.max(calibrated);
        }

        debug!(
            %scan_id,
            raw_score,
            calibrated,
            uncertainty = uncertainty.uncertainty,
            abstain = uncertainty.abstain,
            "Stages completed"
        );

        let contributions = self.ensemble.model_contributions(&ensemble_result);
        Ok(RiskAssessment {
            scan_id,
            domain,
            prediction,
            verdict,
            confidence,
            calibrated_score: round4(calibrated),
            risk_score_percent: (calibrated * 1000.0).round() / 10.0,
            model_version: self.config.model_version.clone(),
            inference_time_ms: (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0,
            ensemble: EnsembleDetails::new(&ensemble_result, raw_score, contributions),
            calibration,
            uncertainty,
            decision,
            data_quality: DataQualityInfo::from(&quality),
            critical_terms: critical_terms(&text, &domain_output.signals),
            governance_flags: GovernanceFlags {
                political_risk_detected,
                sensitive_content_score: round4(sensitive_content_score),
            },
            model_hash: domain_output.model_hash,
            timestamp: Utc::now(),
        })
    }

    /// Calibration, uncertainty and decision on an already-scored sample.
    fn score_stages(
        &self,
        raw_score: f64,
        classifier_confidence: f64,
        member_scores: &[f64],
        agreement: f64,
        domain: Domain,
    ) -> (CalibrationResult, UncertaintyResult, DecisionResult) {
        let calibration = self
            .calibrator
            .calibrate(raw_score, self.config.calibration.method);
        let uncertainty = self.uncertainty.quantify(
            calibration.calibrated_score,
            classifier_confidence,
            member_scores,
        );
        let decision = self.decisions.decide(
            calibration.calibrated_score,
            uncertainty.uncertainty,
            agreement,
            domain,
        );
        (calibration, uncertainty, decision)
    }

    /// Apply a human correction on the calling thread.
    pub fn submit_feedback(&self, submission: FeedbackSubmission) -> FeedbackResult<FeedbackRecord> {
        self.feedback.submit_correction(submission)
    }

    /// Queue plus worker for out-of-band feedback ingestion.
    pub fn feedback_channel(&self) -> (FeedbackSender, FeedbackWorker) {
        FeedbackWorker::channel(Arc::clone(&self.feedback))
    }

    pub fn feedback(&self) -> &Arc<FeedbackLoop> {
        &self.feedback
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.feedback.performance_report()
    }

    pub fn adaptive_weights(&self) -> WeightReport {
        self.ensemble.weights().report()
    }

    pub fn weights(&self) -> &Arc<AdaptiveWeights> {
        self.ensemble.weights()
    }

    pub fn decision_stats(&self) -> DecisionStats {
        self.decisions.decision_stats()
    }

    pub fn decision_engine(&self) -> &ConfidenceDecisionEngine {
        &self.decisions
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl std::fmt::Debug for RiskPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskPipeline")
            .field("members", &self.ensemble.member_names())
            .field("classifiers", &self.classifiers)
            .field("breaker", &self.breaker.stats())
            .finish()
    }
}
