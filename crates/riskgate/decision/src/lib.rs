//! # RiskGate Decision
//!
//! Turns a calibrated score, its uncertainty, and ensemble agreement into
//! a risk level, a verdict and a decision confidence, applying per-domain
//! adjustments. Every decision is kept in a bounded log for rolling
//! statistics.

pub mod config;
pub mod engine;

pub use config::{DomainThresholds, InvalidThresholds, ThresholdConfig};
pub use engine::{ConfidenceDecisionEngine, DecisionRecord, DecisionResult, DecisionStats};
