//! # RiskGate Service
//!
//! Wires the pipeline stages into a single [`RiskPipeline`] and provides
//! the `riskgate` command-line binary.
//!
//! ## Example
//!
//! ```rust,no_run
//! use riskgate_service::{RiskGateConfig, RiskPipeline};
//! use riskgate_types::{Domain, TextSample};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = RiskPipeline::from_config(RiskGateConfig::default())?;
//! let sample = TextSample::new("Denúncia de propina na licitação da prefeitura.")
//!     .with_domain(Domain::General);
//! let assessment = pipeline.evaluate(sample).await?;
//! println!("{} ({:.1}%)", assessment.prediction, assessment.risk_score_percent);
//! # Ok(())
//! # }
//! ```

pub mod assessment;
pub mod builder;
pub mod classifiers;
pub mod config;
pub mod error;
pub mod pipeline;

pub use assessment::{DataQualityInfo, EnsembleDetails, GovernanceFlags, RiskAssessment};
pub use builder::RiskPipelineBuilder;
pub use classifiers::{model_hash, ClassifierSet, LexiconClassifier, LEXICON_VERSION};
pub use config::{
    CalibrationConfig, InferenceConfig, LoggingConfig, ResilienceConfig, RiskGateConfig,
};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::RiskPipeline;
