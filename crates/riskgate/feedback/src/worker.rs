//! Queued feedback ingestion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{FeedbackError, FeedbackResult};
use crate::feedback_loop::FeedbackLoop;
use crate::record::FeedbackSubmission;

/// Cloneable handle for queueing corrections.
#[derive(Debug, Clone)]
pub struct FeedbackSender {
    tx: mpsc::Sender<FeedbackSubmission>,
}

impl FeedbackSender {
    /// Queue a correction, waiting for space if the queue is full.
    pub async fn submit(&self, submission: FeedbackSubmission) -> FeedbackResult<()> {
        let score = submission.original_score;
        if !(0.0..=1.0).contains(&score) {
            return Err(FeedbackError::InvalidScore(score));
        }
        self.tx
            .send(submission)
            .await
            .map_err(|_| FeedbackError::QueueClosed)
    }
}

/// Drains the queue into a [`FeedbackLoop`].
pub struct FeedbackWorker {
    rx: mpsc::Receiver<FeedbackSubmission>,
    feedback: Arc<FeedbackLoop>,
}

impl FeedbackWorker {
    /// Create a bounded queue feeding `feedback`.
    pub fn channel(feedback: Arc<FeedbackLoop>) -> (FeedbackSender, FeedbackWorker) {
        let (tx, rx) = mpsc::channel(feedback.config().queue_capacity.max(1));
        (FeedbackSender { tx }, FeedbackWorker { rx, feedback })
    }

    /// Process submissions until every sender is dropped. Returns the number
    /// of records accepted.
    pub async fn run(mut self) -> u64 {
        let mut processed = 0;
        while let Some(submission) = self.rx.recv().await {
            match self.feedback.submit_correction(submission) {
                Ok(_) => processed += 1,
                Err(e) => warn!(error = %e, "Dropping feedback submission"),
            }
        }
        info!(processed, "Feedback worker stopped");
        processed
    }

    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_types::RiskLevel;

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let feedback = Arc::new(FeedbackLoop::default());
        let (sender, worker) = FeedbackWorker::channel(feedback.clone());
        let handle = worker.spawn();

        for i in 0..3 {
            sender
                .submit(FeedbackSubmission::new(
                    format!("scan-{}", i),
                    RiskLevel::HighRisk,
                    0.9,
                    RiskLevel::NoRisk,
                ))
                .await
                .unwrap();
        }
        drop(sender);

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(feedback.performance_report().overall.false_positive_count, 3);
    }

    #[tokio::test]
    async fn test_submit_after_worker_stops() {
        let feedback = Arc::new(FeedbackLoop::default());
        let (sender, worker) = FeedbackWorker::channel(feedback);
        drop(worker);

        let result = sender
            .submit(FeedbackSubmission::new("scan", RiskLevel::HighRisk, 0.9, RiskLevel::NoRisk))
            .await;
        assert_eq!(result, Err(FeedbackError::QueueClosed));
    }

    #[tokio::test]
    async fn test_invalid_score_rejected_before_queueing() {
        let feedback = Arc::new(FeedbackLoop::default());
        let (sender, _worker) = FeedbackWorker::channel(feedback);
        let result = sender
            .submit(FeedbackSubmission::new("scan", RiskLevel::HighRisk, -0.1, RiskLevel::NoRisk))
            .await;
        assert_eq!(result, Err(FeedbackError::InvalidScore(-0.1)));
    }
}
