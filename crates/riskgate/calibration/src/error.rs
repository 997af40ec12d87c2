//! Error types for offline fitting and metric computation.

use thiserror::Error;

/// Errors that can occur while fitting a calibrator or computing metrics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("length mismatch: {scores} scores but {labels} labels")]
    LengthMismatch { scores: usize, labels: usize },

    #[error("invalid label {0}: labels must be 0 or 1")]
    InvalidLabel(f64),
}

/// Result type for fitting operations.
pub type FitResult<T> = Result<T, CalibrationError>;
