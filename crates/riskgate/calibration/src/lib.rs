//! # RiskGate Calibration
//!
//! Maps a raw ensemble score to a calibrated probability. Every technique is
//! a pure `score -> score` mapping at request time; fitting happens offline.
//!
//! - [`PlattScaling`]: logistic transform, fitted by maximum likelihood
//! - [`IsotonicCalibrator`]: monotone step mapping, fitted by pool-adjacent-violators
//! - [`TemperatureScaling`]: logit rescale by a fixed temperature
//! - [`metrics`]: ECE, Brier score and reliability curves
//! - [`Calibrator`]: holds one of each and reports metrics with every call

pub mod calibrator;
pub mod error;
pub mod isotonic;
pub mod method;
pub mod metrics;
pub mod platt;
pub mod temperature;

pub use calibrator::{CalibrationParams, CalibrationResult, Calibrator, MetricsSource};
pub use error::{CalibrationError, FitResult};
pub use isotonic::IsotonicCalibrator;
pub use method::{CalibrationMethod, ModelKind, UnknownMethod};
pub use metrics::{reliability_curve, CalibrationMetrics, ReliabilityBin};
pub use platt::PlattScaling;
pub use temperature::TemperatureScaling;

/// Logistic function, stable for large magnitudes.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Check that scores and labels line up and labels are binary.
pub(crate) fn validate_pairs(scores: &[f64], labels: &[f64], min: usize) -> FitResult<()> {
    if scores.len() != labels.len() {
        return Err(CalibrationError::LengthMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    if scores.len() < min {
        return Err(CalibrationError::InsufficientData {
            required: min,
            actual: scores.len(),
        });
    }
    if let Some(label) = labels.iter().find(|l| **l != 0.0 && **l != 1.0) {
        return Err(CalibrationError::InvalidLabel(*label));
    }
    Ok(())
}
