//! # RiskGate Resilience
//!
//! Guards the decision pipeline against cascading failure.
//!
//! - [`CircuitBreaker`]: counts consecutive pipeline failures and fails fast
//!   once the threshold is reached, closing again after a reset timeout
//! - [`BoundedExecutor`]: runs a stage under a wall-clock deadline
//!
//! ## Abandonable stages
//!
//! The executor does not kill work that overruns its deadline. The caller is
//! unblocked with [`ExecutionError::Timeout`] and the stage keeps running on
//! the blocking pool until it returns. Every stage handed to the executor
//! must therefore be safe to abandon: it must not hold a lock across the call
//! and must not leave shared state half-written.

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod executor;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerStats, CircuitState};
pub use config::{CircuitBreakerConfig, ExecutorConfig};
pub use error::{ExecutionError, ExecutionResult};
pub use executor::BoundedExecutor;
