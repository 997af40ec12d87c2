//! Platt scaling.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FitResult;
use crate::{sigmoid, validate_pairs};

const MAX_ITERATIONS: usize = 100;
const MIN_STEP: f64 = 1e-10;
const GRADIENT_TOLERANCE: f64 = 1e-9;
const RIDGE: f64 = 1e-12;

/// `sigmoid(a * score + b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
    #[serde(default)]
    fitted: bool,
}

impl PlattScaling {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            a,
            b,
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn calibrate(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b).clamp(0.0, 1.0)
    }

    /// Fit slope and intercept by maximum likelihood.
    ///
    /// Newton iterations with backtracking from the current parameters.
    /// Targets use Platt's smoothing, `(N+ + 1) / (N+ + 2)` and
    /// `1 / (N- + 2)`, so separable data still has a finite optimum.
    pub fn fit(&mut self, scores: &[f64], labels: &[f64]) -> FitResult<&mut Self> {
        validate_pairs(scores, labels, 2)?;

        let positives = labels.iter().filter(|l| **l == 1.0).count() as f64;
        let negatives = labels.len() as f64 - positives;
        let hi = (positives + 1.0) / (positives + 2.0);
        let lo = 1.0 / (negatives + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l == 1.0 { hi } else { lo })
            .collect();

        let (mut a, mut b) = (self.a, self.b);
        let mut loss = negative_log_likelihood(scores, &targets, a, b);
        let mut iterations = 0;

        while iterations < MAX_ITERATIONS {
            iterations += 1;

            let (mut ga, mut gb) = (0.0, 0.0);
            let (mut h_aa, mut h_ab, mut h_bb) = (RIDGE, 0.0, RIDGE);
            for (s, t) in scores.iter().zip(&targets) {
                let p = sigmoid(a * s + b);
                let d = p - t;
                ga += d * s;
                gb += d;
                let w = p * (1.0 - p);
                h_aa += w * s * s;
                h_ab += w * s;
                h_bb += w;
            }

            if ga.abs() < GRADIENT_TOLERANCE && gb.abs() < GRADIENT_TOLERANCE {
                break;
            }

            let det = h_aa * h_bb - h_ab * h_ab;
            let (da, db) = if det.abs() > f64::EPSILON {
                (-(h_bb * ga - h_ab * gb) / det, -(h_aa * gb - h_ab * ga) / det)
            } else {
                (-ga, -gb)
            };

            let mut step = 1.0;
            let mut improved = false;
            while step >= MIN_STEP {
                let (na, nb) = (a + step * da, b + step * db);
                let candidate = negative_log_likelihood(scores, &targets, na, nb);
                if candidate < loss {
                    a = na;
                    b = nb;
                    loss = candidate;
                    improved = true;
                    break;
                }
                step /= 2.0;
            }
            if !improved {
                break;
            }
        }

        debug!(a, b, loss, iterations, "Platt scaling fitted");
        self.a = a;
        self.b = b;
        self.fitted = true;
        Ok(self)
    }
}

fn negative_log_likelihood(scores: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    scores
        .iter()
        .zip(targets)
        .map(|(s, t)| {
            let p = sigmoid(a * s + b).clamp(1e-10, 1.0 - 1e-10);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalibrationError;

    #[test]
    fn test_calibrate_is_monotone_for_positive_slope() {
        let platt = PlattScaling::new(5.0, -2.5);
        assert!((platt.calibrate(0.5) - 0.5).abs() < 1e-12);
        assert!(platt.calibrate(0.9) > platt.calibrate(0.1));
    }

    #[test]
    fn test_fit_learns_positive_slope() {
        let scores = [0.05, 0.1, 0.2, 0.3, 0.35, 0.6, 0.7, 0.8, 0.9, 0.95];
        let labels = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut platt = PlattScaling::new(0.0, 0.0);
        platt.fit(&scores, &labels).unwrap();

        assert!(platt.is_fitted());
        assert!(platt.a > 0.0);
        assert!(platt.calibrate(0.9) > 0.5);
        assert!(platt.calibrate(0.1) < 0.5);
    }

    #[test]
    fn test_fit_handles_separable_data() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [0.0, 0.0, 1.0, 1.0];
        let mut platt = PlattScaling::new(0.0, 0.0);
        platt.fit(&scores, &labels).unwrap();
        assert!(platt.a.is_finite() && platt.b.is_finite());
        assert!(platt.calibrate(0.9) > platt.calibrate(0.1));
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let mut platt = PlattScaling::new(1.0, 0.0);
        assert!(matches!(
            platt.fit(&[0.1, 0.2], &[0.0]),
            Err(CalibrationError::LengthMismatch { .. })
        ));
        assert!(matches!(
            platt.fit(&[0.1, 0.2], &[0.0, 0.5]),
            Err(CalibrationError::InvalidLabel(_))
        ));
        assert!(matches!(
            platt.fit(&[0.1], &[1.0]),
            Err(CalibrationError::InsufficientData { .. })
        ));
    }
}
