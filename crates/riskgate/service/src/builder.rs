//! Builder for RiskPipeline
//!
//! Every component is constructed here from [`RiskGateConfig`] unless the
//! caller injects its own. Tests use this to install stub members or
//! classifiers.

use std::sync::Arc;

use riskgate_calibration::Calibrator;
use riskgate_decision::ConfidenceDecisionEngine;
use riskgate_ensemble::{default_members, AdaptiveWeights, EnsembleCoordinator, EnsembleMember};
use riskgate_feedback::FeedbackLoop;
use riskgate_quality::DataQualityGate;
use riskgate_resilience::{BoundedExecutor, CircuitBreaker};
use riskgate_uncertainty::UncertaintyQuantifier;

use crate::classifiers::ClassifierSet;
use crate::config::RiskGateConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::RiskPipeline;

/// Builder for constructing a RiskPipeline with all dependencies
pub struct RiskPipelineBuilder {
    config: RiskGateConfig,
    members: Option<Vec<Arc<dyn EnsembleMember>>>,
    weights: Option<Arc<AdaptiveWeights>>,
    classifiers: Option<ClassifierSet>,
    calibrator: Option<Calibrator>,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl RiskPipelineBuilder {
    /// Create a new builder for the given configuration
    pub fn new(config: RiskGateConfig) -> Self {
        Self {
            config,
            members: None,
            weights: None,
            classifiers: None,
            calibrator: None,
            breaker: None,
        }
    }

    /// Set the ensemble members
    pub fn with_members(mut self, members: Vec<Arc<dyn EnsembleMember>>) -> Self {
        self.members = Some(members);
        self
    }

    /// Share an existing adaptive weights instance
    pub fn with_weights(mut self, weights: Arc<AdaptiveWeights>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set the domain classifiers
    pub fn with_classifiers(mut self, classifiers: ClassifierSet) -> Self {
        self.classifiers = Some(classifiers);
        self
    }

    /// Set a pre-fitted calibrator
    pub fn with_calibrator(mut self, calibrator: Calibrator) -> Self {
        self.calibrator = Some(calibrator);
        self
    }

    /// Share an existing circuit breaker
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Build the pipeline with all components
    pub fn build(self) -> PipelineResult<RiskPipeline> {
        let config = self.config;
        config.validate()?;

        let members = self.members.unwrap_or_else(default_members);
        if members.is_empty() {
            return Err(PipelineError::Config(
                "at least one ensemble member is required".into(),
            ));
        }

        let weights = self
            .weights
            .unwrap_or_else(|| Arc::new(AdaptiveWeights::default()));
        let ensemble = Arc::new(EnsembleCoordinator::new(members, Arc::clone(&weights)));
        let feedback =
            Arc::new(FeedbackLoop::new(config.feedback.clone()).with_weights(Arc::clone(&weights)));

        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(config.resilience.breaker())));
        let executor = BoundedExecutor::new(config.inference.executor());
        let gate = Arc::new(DataQualityGate::new(config.quality.clone()));
        let calibrator = self
            .calibrator
            .unwrap_or_else(|| Calibrator::new(config.calibration.params()));
        let uncertainty = UncertaintyQuantifier::new(config.uncertainty.clone());
        let decisions = ConfidenceDecisionEngine::new(config.decision.clone());
        let classifiers = self.classifiers.unwrap_or_default();

        Ok(RiskPipeline {
            config,
            breaker,
            executor,
            gate,
            ensemble,
            classifiers,
            calibrator,
            uncertainty,
            decisions,
            feedback,
        })
    }
}

impl Default for RiskPipelineBuilder {
    fn default() -> Self {
        Self::new(RiskGateConfig::default())
    }
}
