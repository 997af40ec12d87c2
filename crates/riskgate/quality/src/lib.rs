//! # RiskGate Quality
//!
//! The data-quality gate runs before any model sees a sample. It is the only
//! point where a sample can be rejected without inference: an unusable report
//! short-circuits the pipeline.
//!
//! Checks, each independent:
//!
//! - language plausibility (common PT-BR and English words)
//! - length bounds
//! - truncation markers or a missing terminal punctuation mark
//! - duplicate content against a bounded set of recent hashes
//! - content heuristics: all caps, special characters, repetition, URLs
//! - public-entity mentions (recorded, never failed)

pub mod checks;
pub mod config;
pub mod dedup;
pub mod gate;
pub mod report;

pub use config::QualityConfig;
pub use dedup::DedupCache;
pub use gate::DataQualityGate;
pub use report::{IssueCode, LengthInfo, QualityIssue, QualityMetadata, QualityReport, Severity};
