//! Isotonic regression calibration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FitResult;
use crate::validate_pairs;

/// Monotone non-decreasing mapping learned from labeled scores.
///
/// Between fitted points the mapping is linearly interpolated; outside the
/// fitted range it is clipped to the end values. An unfitted calibrator
/// is the identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsotonicCalibrator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl IsotonicCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.xs.is_empty()
    }

    /// Fit with pool-adjacent-violators.
    pub fn fit(&mut self, scores: &[f64], labels: &[f64]) -> FitResult<&mut Self> {
        validate_pairs(scores, labels, 1)?;

        let mut pairs: Vec<(f64, f64)> = scores.iter().copied().zip(labels.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        // (x, sum of labels, weight) with equal scores pooled up front
        let mut points: Vec<(f64, f64, f64)> = Vec::new();
        for (x, y) in pairs {
            match points.last_mut() {
                Some(last) if last.0 == x => {
                    last.1 += y;
                    last.2 += 1.0;
                }
                _ => points.push((x, y, 1.0)),
            }
        }

        // blocks: (sum, weight, number of points)
        let mut blocks: Vec<(f64, f64, usize)> = Vec::new();
        for (_, sum, weight) in &points {
            blocks.push((*sum, *weight, 1));
            while blocks.len() > 1 {
                let n = blocks.len();
                let (s1, w1, c1) = blocks[n - 2];
                let (s2, w2, c2) = blocks[n - 1];
                if s1 / w1 <= s2 / w2 {
                    break;
                }
                blocks.truncate(n - 2);
                blocks.push((s1 + s2, w1 + w2, c1 + c2));
            }
        }

        self.xs = points.iter().map(|p| p.0).collect();
        self.ys = blocks
            .iter()
            .flat_map(|(sum, weight, count)| std::iter::repeat(sum / weight).take(*count))
            .collect();

        debug!(points = self.xs.len(), blocks = blocks.len(), "Isotonic calibrator fitted");
        Ok(self)
    }

    pub fn calibrate(&self, score: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.xs.first(), self.xs.last()) else {
            return if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        };

        if score.is_nan() || score <= first {
            return self.ys[0].clamp(0.0, 1.0);
        }
        if score >= last {
            return self.ys[self.ys.len() - 1].clamp(0.0, 1.0);
        }

        // first index with xs[i] > score; 1 <= upper < len here
        let upper = self.xs.partition_point(|x| *x <= score);
        let (x0, x1) = (self.xs[upper - 1], self.xs[upper]);
        let (y0, y1) = (self.ys[upper - 1], self.ys[upper]);
        let t = (score - x0) / (x1 - x0);
        (y0 + t * (y1 - y0)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_maps_to_lowest_level() {
        let mut iso = IsotonicCalibrator::new();
        iso.fit(&[0.1, 0.2, 0.3, 0.4], &[0.0, 0.0, 1.0, 1.0]).unwrap();
        let low = iso.calibrate(0.0);
        assert_eq!(iso.calibrate(f64::NAN), low);
        assert_eq!(IsotonicCalibrator::new().calibrate(f64::NAN), 0.0);
    }

    #[test]
    fn test_unfitted_is_identity() {
        let iso = IsotonicCalibrator::new();
        assert!(!iso.is_fitted());
        assert_eq!(iso.calibrate(0.37), 0.37);
    }

    #[test]
    fn test_pav_pools_violators() {
        let mut iso = IsotonicCalibrator::new();
        iso.fit(&[0.1, 0.2, 0.3, 0.4], &[0.0, 1.0, 0.0, 1.0]).unwrap();

        // 0.2 and 0.3 pool to 0.5
        assert_eq!(iso.calibrate(0.1), 0.0);
        assert!((iso.calibrate(0.2) - 0.5).abs() < 1e-12);
        assert!((iso.calibrate(0.3) - 0.5).abs() < 1e-12);
        assert_eq!(iso.calibrate(0.4), 1.0);
    }

    #[test]
    fn test_clips_outside_range_and_interpolates() {
        let mut iso = IsotonicCalibrator::new();
        iso.fit(&[0.2, 0.8], &[0.0, 1.0]).unwrap();
        assert_eq!(iso.calibrate(0.0), 0.0);
        assert_eq!(iso.calibrate(1.0), 1.0);
        assert!((iso.calibrate(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fitted_mapping_is_monotone() {
        let scores = [0.9, 0.1, 0.5, 0.3, 0.7, 0.2, 0.6, 0.4, 0.8];
        let labels = [1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let mut iso = IsotonicCalibrator::new();
        iso.fit(&scores, &labels).unwrap();

        let mut previous = 0.0;
        for i in 0..=20 {
            let value = iso.calibrate(i as f64 / 20.0);
            assert!(value >= previous - 1e-12);
            previous = value;
        }
    }
}
