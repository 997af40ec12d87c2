//! Request-time calibrator.

use std::collections::HashMap;

use riskgate_types::stats::round4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FitResult;
use crate::isotonic::IsotonicCalibrator;
use crate::method::{CalibrationMethod, ModelKind};
use crate::metrics::{per_call_brier, per_call_ece, CalibrationMetrics};
use crate::platt::PlattScaling;
use crate::temperature::TemperatureScaling;

const HELD_OUT_BINS: usize = 10;

/// Parameters of the fixed-form calibrators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    pub platt_a: f64,
    pub platt_b: f64,
    pub temperature: f64,
}

impl CalibrationParams {
    /// Defaults per model kind. Platt slopes are positive so the mapping
    /// preserves risk ordering, centred near a raw score of 0.5.
    pub fn for_model(kind: ModelKind) -> Self {
        match kind {
            ModelKind::RiskClassifier => Self {
                platt_a: 5.0,
                platt_b: -2.5,
                temperature: 1.3,
            },
            ModelKind::DefamationDetector => Self {
                platt_a: 4.8,
                platt_b: -2.3,
                temperature: 1.4,
            },
            ModelKind::Ner => Self {
                platt_a: 4.5,
                platt_b: -2.2,
                temperature: 1.2,
            },
        }
    }
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self::for_model(ModelKind::RiskClassifier)
    }
}

/// Where the reported ECE / Brier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    /// Single-pair approximation from this call.
    PerCall,
    /// Held-out set attached to the calibrator.
    HeldOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub raw_score: f64,
    pub calibrated_score: f64,
    pub method: CalibrationMethod,
    pub ece: f64,
    pub brier_score: f64,
    pub metrics_source: MetricsSource,
}

/// One calibrator of each kind plus optional held-out metrics.
///
/// Read-only at request time; fitting takes `&mut self` and happens before
/// the calibrator is shared.
#[derive(Debug, Clone)]
pub struct Calibrator {
    platt: PlattScaling,
    isotonic: IsotonicCalibrator,
    temperature: TemperatureScaling,
    held_out: HashMap<CalibrationMethod, CalibrationMetrics>,
}

impl Calibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            platt: PlattScaling::new(params.platt_a, params.platt_b),
            isotonic: IsotonicCalibrator::new(),
            temperature: TemperatureScaling::new(params.temperature),
            held_out: HashMap::new(),
        }
    }

    pub fn for_model(kind: ModelKind) -> Self {
        Self::new(CalibrationParams::for_model(kind))
    }

    pub fn platt(&self) -> &PlattScaling {
        &self.platt
    }

    pub fn isotonic(&self) -> &IsotonicCalibrator {
        &self.isotonic
    }

    pub fn temperature(&self) -> &TemperatureScaling {
        &self.temperature
    }

    /// Held-out metrics of `method`'s mapping, if a set is attached.
    pub fn held_out_metrics(&self, method: CalibrationMethod) -> Option<&CalibrationMetrics> {
        self.held_out.get(&method)
    }

    /// Fit both learnable calibrators on the same labeled set.
    pub fn fit(&mut self, scores: &[f64], labels: &[f64]) -> FitResult<()> {
        self.platt.fit(scores, labels)?;
        self.isotonic.fit(scores, labels)?;
        info!(samples = scores.len(), a = self.platt.a, b = self.platt.b, "Calibrator fitted");
        Ok(())
    }

    /// Attach a held-out set; every later call reports the metrics of the
    /// method it used.
    ///
    /// Scores are the raw scores. Metrics are computed once per method over
    /// that method's mapping of them, so attach after fitting.
    pub fn with_held_out(mut self, scores: &[f64], labels: &[f64]) -> FitResult<Self> {
        let mut held_out = HashMap::with_capacity(CalibrationMethod::ALL.len());
        for method in CalibrationMethod::ALL {
            let calibrated: Vec<f64> = scores.iter().map(|s| self.apply(*s, method)).collect();
            held_out.insert(method, CalibrationMetrics::evaluate(&calibrated, labels, HELD_OUT_BINS)?);
        }
        self.held_out = held_out;
        Ok(self)
    }

    fn apply(&self, raw: f64, method: CalibrationMethod) -> f64 {
        match method {
            CalibrationMethod::Platt => self.platt.calibrate(raw),
            CalibrationMethod::Isotonic => self.isotonic.calibrate(raw),
            CalibrationMethod::Temperature => self.temperature.calibrate(raw),
        }
    }

    pub fn calibrate(&self, raw_score: f64, method: CalibrationMethod) -> CalibrationResult {
        let raw = if raw_score.is_nan() {
            0.0
        } else {
            raw_score.clamp(0.0, 1.0)
        };
        let calibrated = self.apply(raw, method);

        let (ece, brier_score, metrics_source) = match self.held_out.get(&method) {
            Some(metrics) => (metrics.ece, metrics.brier_score, MetricsSource::HeldOut),
            None => (
                per_call_ece(raw, calibrated),
                per_call_brier(calibrated),
                MetricsSource::PerCall,
            ),
        };

        debug!(raw, calibrated, %method, "Score calibrated");

        CalibrationResult {
            raw_score: round4(raw),
            calibrated_score: round4(calibrated),
            method,
            ece: round4(ece),
            brier_score: round4(brier_score),
            metrics_source,
        }
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationParams::default())
    }
}
