//! Deadline-bounded stage execution.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::error::{ExecutionError, ExecutionResult};

/// Runs one unit of synchronous stage work under a wall-clock deadline.
///
/// Work runs on the blocking pool. On deadline expiry the caller gets
/// [`ExecutionError::Timeout`] and the handle is dropped; the work itself
/// continues to completion and its result is discarded.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    timeout: Duration,
}

impl BoundedExecutor {
    /// Create an executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            timeout: config.timeout,
        }
    }

    /// Deadline applied by [`run`](Self::run).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `work` under the default deadline.
    pub async fn run<F, T>(&self, stage: &'static str, work: F) -> ExecutionResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.run_with_timeout(stage, self.timeout, work).await
    }

    /// Run `work` under an explicit deadline.
    pub async fn run_with_timeout<F, T>(
        &self,
        stage: &'static str,
        timeout: Duration,
        work: F,
    ) -> ExecutionResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(value)) => {
                debug!(stage, "Stage completed within deadline");
                Ok(value)
            }
            Ok(Err(join_error)) => {
                warn!(stage, error = %join_error, "Stage aborted");
                Err(ExecutionError::Aborted {
                    stage,
                    reason: join_error.to_string(),
                })
            }
            Err(_) => {
                let timeout_ms = timeout.as_millis() as u64;
                warn!(stage, timeout_ms, "Stage exceeded deadline, abandoning");
                Err(ExecutionError::Timeout { stage, timeout_ms })
            }
        }
    }
}

impl Default for BoundedExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn executor(ms: u64) -> BoundedExecutor {
        BoundedExecutor::new(ExecutorConfig {
            timeout: Duration::from_millis(ms),
        })
    }

    #[tokio::test]
    async fn test_fast_stage_returns_value() {
        let result = executor(500).run("quality", || 21 * 2).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_slow_stage_times_out() {
        let result = executor(20)
            .run("ensemble", || {
                std::thread::sleep(Duration::from_millis(200));
                1
            })
            .await;

        assert_eq!(
            result,
            Err(ExecutionError::Timeout {
                stage: "ensemble",
                timeout_ms: 20
            })
        );
    }

    #[tokio::test]
    async fn test_abandoned_stage_runs_to_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = executor(10)
            .run("quality", move || {
                std::thread::sleep(Duration::from_millis(60));
                flag.store(true, Ordering::SeqCst);
            })
            .await;
        assert!(matches!(result, Err(ExecutionError::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_stage_is_aborted() {
        let result: ExecutionResult<()> = executor(500)
            .run("quality", || panic!("stage blew up"))
            .await;
        assert!(matches!(
            result,
            Err(ExecutionError::Aborted { stage: "quality", .. })
        ));
    }
}
