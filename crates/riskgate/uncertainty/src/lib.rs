//! # RiskGate Uncertainty
//!
//! Estimates how far a calibrated score can be trusted and decides whether
//! the pipeline should defer to a human.
//!
//! Epistemic uncertainty is simulated by resampling the score under noise
//! seeded from the score itself, so the same score always yields the same
//! estimate. Aleatoric uncertainty is a step function of model confidence.

pub mod conformal;
pub mod config;
pub mod quantifier;

pub use conformal::ConformalResult;
pub use config::UncertaintyConfig;
pub use quantifier::{point_label, UncertaintyQuantifier, UncertaintyResult};
