//! Error types for riskgate-resilience.

use thiserror::Error;

/// Failure of a stage run through the [`BoundedExecutor`](crate::BoundedExecutor).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The stage did not finish before its deadline.
    #[error("stage {stage} timed out after {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    /// The stage panicked or its task was cancelled.
    #[error("stage {stage} aborted: {reason}")]
    Aborted { stage: &'static str, reason: String },
}

/// Result type for bounded execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
