//! # RiskGate Feedback
//!
//! The write path of the system. Human corrections are classified, folded
//! into performance counters, and periodically turned into threshold
//! suggestions and adaptive weight updates for the ensemble.
//!
//! Submissions can be made directly on a [`FeedbackLoop`] or queued through
//! a [`FeedbackSender`] and drained by a [`FeedbackWorker`], so that scoring
//! requests never wait on feedback processing.

pub mod config;
pub mod error;
pub mod feedback_loop;
pub mod metrics;
pub mod record;
pub mod worker;

pub use config::FeedbackConfig;
pub use error::{FeedbackError, FeedbackResult};
pub use feedback_loop::FeedbackLoop;
pub use metrics::{
    DomainReport, ErrorPattern, ModelReport, OverallReport, PerformanceMetrics, PerformanceReport,
    ProblematicPatterns,
};
pub use record::{FeedbackRecord, FeedbackSubmission, FeedbackType, Label};
pub use worker::{FeedbackSender, FeedbackWorker};
