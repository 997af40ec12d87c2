//! Adaptive ensemble weights.
//!
//! Writers (the feedback path) mutate per-model accuracy under a mutex and
//! publish a fresh [`WeightSnapshot`]. Readers (the request path) clone the
//! current snapshot `Arc` and never wait on a rebalance.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use riskgate_types::stats::{mean, round4};

/// Initial weights of the built-in members and the semantic pseudo-model.
pub const BASE_WEIGHTS: [(&str, f64); 4] = [
    ("transformer", 0.40),
    ("linear", 0.25),
    ("rules", 0.20),
    ("semantic", 0.15),
];

const MAX_HISTORY: usize = 100;
const MIN_SAMPLES: usize = 5;
const RECENT_WINDOW: usize = 20;
const MIN_WEIGHT: f64 = 0.05;
const MAX_WEIGHT: f64 = 0.6;
const ADJUSTMENT_RATE: f64 = 0.1;

/// Scale weights to sum to one. All-zero input is returned unchanged.
pub fn normalize(weights: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return weights.clone();
    }
    weights
        .iter()
        .map(|(name, weight)| (name.clone(), weight / total))
        .collect()
}

/// Weight and accuracy history of one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveWeight {
    pub model_name: String,
    pub base_weight: f64,
    pub current_weight: f64,
    /// 1.0 for a correct call, 0.0 otherwise, newest last.
    pub accuracy_history: VecDeque<f64>,
    pub last_updated: DateTime<Utc>,
}

impl AdaptiveWeight {
    fn new(model_name: &str, base_weight: f64) -> Self {
        Self {
            model_name: model_name.to_string(),
            base_weight,
            current_weight: base_weight,
            accuracy_history: VecDeque::new(),
            last_updated: Utc::now(),
        }
    }

    fn record(&mut self, accuracy: f64) {
        self.accuracy_history.push_back(accuracy);
        while self.accuracy_history.len() > MAX_HISTORY {
            self.accuracy_history.pop_front();
        }
    }

    /// Mean accuracy over the most recent window.
    pub fn recent_accuracy(&self) -> f64 {
        let skip = self.accuracy_history.len().saturating_sub(RECENT_WINDOW);
        let recent: Vec<f64> = self.accuracy_history.iter().skip(skip).copied().collect();
        mean(&recent)
    }
}

/// Immutable, normalized weights read by the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    /// Bumped on every publish.
    pub version: u64,
    pub weights: BTreeMap<String, f64>,
}

impl WeightSnapshot {
    /// Weight of a model; 0 for an unknown name.
    pub fn get(&self, model_name: &str) -> f64 {
        self.weights.get(model_name).copied().unwrap_or(0.0)
    }
}

/// Per-model entry of a [`WeightReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeightReport {
    pub base_weight: f64,
    pub current_weight: f64,
    pub recent_accuracy: f64,
    pub total_samples: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightReport {
    pub total_feedback: u64,
    pub snapshot_version: u64,
    pub models: BTreeMap<String, ModelWeightReport>,
}

#[derive(Debug)]
struct WeightState {
    models: BTreeMap<String, AdaptiveWeight>,
    outcomes: u64,
    version: u64,
}

/// Live ensemble weights.
#[derive(Debug)]
pub struct AdaptiveWeights {
    base: BTreeMap<String, f64>,
    state: Mutex<WeightState>,
    snapshot: RwLock<Arc<WeightSnapshot>>,
}

impl AdaptiveWeights {
    pub fn new(base: BTreeMap<String, f64>) -> Self {
        let models = base
            .iter()
            .map(|(name, weight)| (name.clone(), AdaptiveWeight::new(name, *weight)))
            .collect();
        let snapshot = WeightSnapshot {
            version: 0,
            weights: normalize(&base),
        };
        Self {
            base,
            state: Mutex::new(WeightState {
                models,
                outcomes: 0,
                version: 0,
            }),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current published snapshot.
    pub fn snapshot(&self) -> Arc<WeightSnapshot> {
        self.snapshot.read().clone()
    }

    /// Record whether each model's signal agreed with the corrected label.
    ///
    /// A signal above 0.5 counts as a risk call. Unknown model names are
    /// ignored. Weights are not changed until [`rebalance`](Self::rebalance).
    pub fn record_outcome(&self, model_signals: &BTreeMap<String, f64>, risky: bool) {
        let mut state = self.state.lock();
        state.outcomes += 1;
        for (name, score) in model_signals {
            if let Some(weight) = state.models.get_mut(name) {
                let correct = (*score > 0.5) == risky;
                weight.record(if correct { 1.0 } else { 0.0 });
            }
        }
    }

    /// Recompute weights from recent accuracy and publish a new snapshot.
    ///
    /// Models with fewer than five samples keep their current weight. Each
    /// updated weight is clamped to [0.05, 0.6] before all weights are
    /// renormalized.
    pub fn rebalance(&self) -> Arc<WeightSnapshot> {
        let mut state = self.state.lock();
        let now = Utc::now();

        for weight in state.models.values_mut() {
            if weight.accuracy_history.len() < MIN_SAMPLES {
                continue;
            }
            let adjustment = (weight.recent_accuracy() - 0.5) * ADJUSTMENT_RATE;
            weight.current_weight =
                (weight.base_weight * (1.0 + adjustment)).clamp(MIN_WEIGHT, MAX_WEIGHT);
            weight.last_updated = now;
        }

        let current: BTreeMap<String, f64> = state
            .models
            .iter()
            .map(|(name, w)| (name.clone(), w.current_weight))
            .collect();
        let normalized = normalize(&current);
        for (name, weight) in &normalized {
            if let Some(model) = state.models.get_mut(name) {
                model.current_weight = *weight;
            }
        }

        state.version += 1;
        let snapshot = Arc::new(WeightSnapshot {
            version: state.version,
            weights: normalized,
        });
        *self.snapshot.write() = snapshot.clone();

        info!(version = state.version, weights = ?snapshot.weights, "Ensemble weights rebalanced");
        snapshot
    }

    /// Restore base weights and clear accuracy history.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.models = self
            .base
            .iter()
            .map(|(name, weight)| (name.clone(), AdaptiveWeight::new(name, *weight)))
            .collect();
        state.outcomes = 0;
        state.version += 1;
        *self.snapshot.write() = Arc::new(WeightSnapshot {
            version: state.version,
            weights: normalize(&self.base),
        });
        debug!(version = state.version, "Ensemble weights reset to base");
    }

    pub fn report(&self) -> WeightReport {
        let state = self.state.lock();
        WeightReport {
            total_feedback: state.outcomes,
            snapshot_version: state.version,
            models: state
                .models
                .iter()
                .map(|(name, w)| {
                    (
                        name.clone(),
                        ModelWeightReport {
                            base_weight: w.base_weight,
                            current_weight: round4(w.current_weight),
                            recent_accuracy: round4(w.recent_accuracy()),
                            total_samples: w.accuracy_history.len(),
                            last_updated: w.last_updated,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self::new(
            BASE_WEIGHTS
                .iter()
                .map(|(name, weight)| (name.to_string(), *weight))
                .collect(),
        )
    }
}
