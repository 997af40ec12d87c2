//! Temperature scaling.

use serde::{Deserialize, Serialize};

use crate::sigmoid;

/// Scores are clamped away from 0 and 1 before taking the logit.
const EPSILON: f64 = 1e-6;

/// `sigmoid(logit(score) / temperature)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScaling {
    pub temperature: f64,
}

impl TemperatureScaling {
    /// Non-positive temperatures are replaced by a tiny positive one.
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature: if temperature > 0.0 { temperature } else { EPSILON },
        }
    }

    pub fn calibrate(&self, score: f64) -> f64 {
        let s = score.clamp(EPSILON, 1.0 - EPSILON);
        let logit = (s / (1.0 - s)).ln();
        sigmoid(logit / self.temperature).clamp(0.0, 1.0)
    }
}

impl Default for TemperatureScaling {
    fn default() -> Self {
        Self::new(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_softens_toward_half() {
        let t = TemperatureScaling::new(2.0);
        assert!((t.calibrate(0.5) - 0.5).abs() < 1e-12);
        let high = t.calibrate(0.9);
        assert!(high < 0.9 && high > 0.5);
        let low = t.calibrate(0.1);
        assert!(low > 0.1 && low < 0.5);
    }

    #[test]
    fn test_extremes_stay_in_range() {
        let t = TemperatureScaling::new(1.3);
        assert!(t.calibrate(0.0) >= 0.0);
        assert!(t.calibrate(1.0) <= 1.0);
        assert!(TemperatureScaling::new(-1.0).temperature > 0.0);
    }
}
