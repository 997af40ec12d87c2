//! Circuit breaker for the decision pipeline.
//!
//! Fails fast once too many consecutive pipeline runs have failed, and lets
//! traffic through again once the reset timeout has elapsed since the last
//! failure. There is no half-open probe: the first call after the timeout
//! closes the circuit outright.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally.
    Closed,

    /// Circuit is open, requests are rejected.
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    is_open: bool,
    last_failure: Option<Instant>,
    last_failure_time: Option<DateTime<Utc>>,
}

/// Process-wide circuit breaker guarding the pipeline.
///
/// All state sits behind one mutex owned by the breaker; no other lock is
/// taken while it is held.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Check whether the pipeline may run.
    ///
    /// Side-effecting: an open circuit whose reset timeout has elapsed since
    /// the last failure is closed here and its failure count cleared.
    pub fn can_execute(&self) -> bool {
        let mut state = self.state.lock();
        if !state.is_open {
            return true;
        }

        let elapsed = state.last_failure.map(|at| at.elapsed());
        match elapsed {
            Some(elapsed) if elapsed > self.config.reset_timeout => {
                info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Circuit breaker closing after reset timeout"
                );
                state.is_open = false;
                state.failure_count = 0;
                true
            }
            _ => false,
        }
    }

    /// Record a fully successful pipeline run.
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.is_open {
            debug!("Success recorded while circuit open");
        }
        state.failure_count = 0;
        state.is_open = false;
    }

    /// Record a failed pipeline run.
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(Instant::now());
        state.last_failure_time = Some(Utc::now());

        if state.failure_count >= self.config.failure_threshold && !state.is_open {
            warn!(
                failures = state.failure_count,
                threshold = self.config.failure_threshold,
                "Circuit breaker opening due to failures"
            );
            state.is_open = true;
        }
    }

    /// Current state, without applying the reset timeout.
    pub fn state(&self) -> CircuitState {
        if self.state.lock().is_open {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Consecutive failures since the last success or reset.
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Time left until an open circuit would close, if it is open.
    pub fn retry_after(&self) -> Option<Duration> {
        let state = self.state.lock();
        if !state.is_open {
            return None;
        }
        let elapsed = state.last_failure.map(|at| at.elapsed()).unwrap_or_default();
        Some(self.config.reset_timeout.saturating_sub(elapsed))
    }

    /// Force the circuit closed and clear counters.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        info!(
            was_open = state.is_open,
            failures = state.failure_count,
            "Circuit breaker reset"
        );
        *state = BreakerState::default();
    }

    /// Get circuit breaker statistics.
    pub fn stats(&self) -> CircuitBreakerStats {
        let state = self.state.lock();
        CircuitBreakerStats {
            state: if state.is_open {
                CircuitState::Open
            } else {
                CircuitState::Closed
            },
            failure_count: state.failure_count,
            failure_threshold: self.config.failure_threshold,
            reset_timeout_secs: self.config.reset_timeout.as_secs_f64(),
            last_failure_time: state.last_failure_time,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

/// Statistics for a circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    /// Current state.
    pub state: CircuitState,

    /// Consecutive recorded failures.
    pub failure_count: u32,

    /// Failures needed to open.
    pub failure_threshold: u32,

    /// Reset timeout in seconds.
    pub reset_timeout_secs: f64,

    /// Wall-clock time of the last failure.
    pub last_failure_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 5,
            reset_timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_circuit_breaker_opens_at_threshold() {
        let breaker = CircuitBreaker::new(test_config());
        assert!(breaker.can_execute());

        for _ in 0..4 {
            breaker.record_failure();
            assert!(breaker.can_execute());
        }

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
        assert!(breaker.retry_after().is_some());
    }

    #[test]
    fn test_circuit_breaker_closes_after_reset_timeout() {
        let breaker = CircuitBreaker::new(test_config());
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(!breaker.can_execute());

        std::thread::sleep(Duration::from_millis(80));

        assert!(breaker.can_execute());
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_circuit_breaker_success_resets_failures() {
        let breaker = CircuitBreaker::new(test_config());

        for _ in 0..4 {
            breaker.record_failure();
        }
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);

        for _ in 0..4 {
            breaker.record_failure();
        }
        // Still closed because the success reset the count
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_circuit_breaker_reopens_on_next_breach() {
        let breaker = CircuitBreaker::new(test_config());
        for _ in 0..5 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(80));
        assert!(breaker.can_execute());

        // One failure after closing does not reopen immediately
        breaker.record_failure();
        assert!(breaker.can_execute());

        for _ in 0..4 {
            breaker.record_failure();
        }
        assert!(!breaker.can_execute());
    }

    #[test]
    fn test_stats_report_last_failure() {
        let breaker = CircuitBreaker::new(test_config());
        assert!(breaker.stats().last_failure_time.is_none());
        breaker.record_failure();
        let stats = breaker.stats();
        assert_eq!(stats.failure_count, 1);
        assert!(stats.last_failure_time.is_some());

        breaker.reset();
        assert_eq!(breaker.stats().failure_count, 0);
    }
}
