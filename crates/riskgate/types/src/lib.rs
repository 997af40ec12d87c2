//! # RiskGate Types
//!
//! Shared vocabulary for every stage of the RiskGate decision pipeline.
//!
//! - [`TextSample`]: the immutable request input
//! - [`Domain`]: the closed set of risk domains, with `General` as fallback
//! - [`RiskLevel`] / [`Verdict`]: the labels a decision can carry
//! - [`ModelPrediction`]: one ensemble member's output
//! - [`AbstainReason`]: why a stage deferred to human review
//! - [`DomainClassifier`]: the contract consumed from external classifiers

pub mod classifier;
pub mod domain;
pub mod labels;
pub mod prediction;
pub mod sample;
pub mod stats;

pub use classifier::{ClassifierOutput, DomainClassifier, Signal};
pub use domain::{Domain, UnknownDomain};
pub use labels::{AbstainReason, RiskLevel, UnknownLabel, Verdict};
pub use prediction::ModelPrediction;
pub use sample::{SourceMetadata, TextSample};
