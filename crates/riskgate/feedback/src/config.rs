//! Feedback configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Bound of the submission queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Records kept in memory; the oldest are evicted first.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_history() -> usize {
    10_000
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_history: default_max_history(),
        }
    }
}
