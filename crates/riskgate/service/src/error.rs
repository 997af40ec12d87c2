//! Error types for riskgate-service.
//!
//! Terminal outcomes of a pipeline run. Abstention is not an error: a
//! `HUMAN_REVIEW` assessment is a successful response.

use riskgate_quality::IssueCode;
use riskgate_resilience::ExecutionError;
use thiserror::Error;

/// Errors that can end a pipeline run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Input failed the data-quality gate.
    #[error("data quality insufficient (score {score:.4}): {}", join_codes(.issues))]
    DataQuality { score: f64, issues: Vec<IssueCode> },

    /// A bounded stage exceeded its deadline.
    #[error("stage {stage} timed out after {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    /// The circuit breaker is open; no work was attempted.
    #[error("service temporarily unavailable, retry after {retry_after_secs:.1}s")]
    CircuitOpen { retry_after_secs: f64 },

    /// Unexpected internal fault.
    #[error("evaluation failed: {0}")]
    Service(String),

    /// Startup configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether the caller may retry the same request after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Timeout { .. } | PipelineError::CircuitOpen { .. }
        )
    }

    /// Whether this outcome must be recorded against the circuit breaker.
    ///
    /// An open breaker short-circuits before any work, so it never counts.
    pub fn counts_as_breaker_failure(&self) -> bool {
        !matches!(
            self,
            PipelineError::CircuitOpen { .. } | PipelineError::Config(_)
        )
    }

    /// Stable error code for response payloads.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::DataQuality { .. } => "DATA_QUALITY",
            PipelineError::Timeout { .. } => "TIMEOUT",
            PipelineError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            PipelineError::Service(_) => "SERVICE_ERROR",
            PipelineError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<ExecutionError> for PipelineError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Timeout { stage, timeout_ms } => {
                PipelineError::Timeout { stage, timeout_ms }
            }
            ExecutionError::Aborted { .. } => PipelineError::Service(err.to_string()),
        }
    }
}

fn join_codes(issues: &[IssueCode]) -> String {
    issues
        .iter()
        .map(IssueCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
