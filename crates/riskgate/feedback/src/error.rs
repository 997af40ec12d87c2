//! Error types for feedback submission.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedbackError {
    #[error("feedback queue closed")]
    QueueClosed,

    #[error("invalid original score {0}: must be within [0, 1]")]
    InvalidScore(f64),
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;
