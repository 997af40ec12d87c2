//! Ensemble coordination: weighted voting with disagreement detection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use riskgate_types::stats::{clamp_unit, population_std, round4, spread};
use riskgate_types::{Domain, ModelPrediction};

use crate::members::{default_members, EnsembleMember};
use crate::semantic::SimilarityMatcher;
use crate::weights::AdaptiveWeights;

/// Signal key of the semantic pseudo-model.
pub const SEMANTIC_SIGNAL: &str = "semantic";

const DISAGREEMENT_THRESHOLD: f64 = 0.3;
const MIN_AGREEMENT_FOR_CONFIDENCE: f64 = 0.7;
const DOMAIN_BOOST_FACTOR: f64 = 0.3;

/// Combined output of all ensemble members for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub raw_score: f64,
    /// `1 - std` of the member scores.
    pub agreement: f64,
    /// Member scores plus the `semantic` signal.
    pub signals: BTreeMap<String, f64>,
    pub predictions: Vec<ModelPrediction>,
    pub weights_used: BTreeMap<String, f64>,
    pub semantic_boost: f64,
    pub semantic_pattern: String,
    pub confidence_weighted_score: f64,
    pub disagreement_level: f64,
    pub needs_review: bool,
}

impl EnsembleResult {
    /// Scores of the real members, excluding the semantic signal.
    pub fn member_scores(&self) -> Vec<f64> {
        self.predictions.iter().map(|p| p.score).collect()
    }
}

/// Runs the members and combines their scores.
///
/// Holds no mutable state of its own. Weights are read from the current
/// [`AdaptiveWeights`] snapshot once per call.
pub struct EnsembleCoordinator {
    members: Vec<Arc<dyn EnsembleMember>>,
    matcher: SimilarityMatcher,
    weights: Arc<AdaptiveWeights>,
}

impl EnsembleCoordinator {
    pub fn new(members: Vec<Arc<dyn EnsembleMember>>, weights: Arc<AdaptiveWeights>) -> Self {
        Self {
            members,
            matcher: SimilarityMatcher::default(),
            weights,
        }
    }

    /// Shared weights handle, for the feedback path.
    pub fn weights(&self) -> &Arc<AdaptiveWeights> {
        &self.weights
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn matcher(&self) -> &SimilarityMatcher {
        &self.matcher
    }

    #[instrument(skip(self, text), fields(members = self.members.len()))]
    pub fn predict(&self, text: &str, domain: Option<Domain>) -> EnsembleResult {
        let predictions: Vec<ModelPrediction> =
            self.members.iter().map(|m| m.predict(text)).collect();

        let mut signals: BTreeMap<String, f64> = predictions
            .iter()
            .map(|p| (p.model_name.clone(), p.score))
            .collect();

        let (mut semantic_boost, semantic_pattern) = self.matcher.compute_risk_boost(text);
        signals.insert(SEMANTIC_SIGNAL.to_string(), semantic_boost);

        if let Some(domain) = domain {
            let embedding = self.matcher.embedder().embed(text);
            let domain_score = embedding
                .domain_scores
                .get(domain.as_str())
                .copied()
                .unwrap_or(0.0);
            semantic_boost = semantic_boost.max(domain_score * DOMAIN_BOOST_FACTOR);
        }

        let snapshot = self.weights.snapshot();
        let base_score: f64 = signals
            .iter()
            .map(|(name, score)| score * snapshot.get(name))
            .sum();

        let confidence_score = confidence_weighted(&predictions);
        let final_score =
            clamp_unit(base_score * 0.6 + confidence_score * 0.4 + semantic_boost * 0.5);

        let member_scores: Vec<f64> = predictions.iter().map(|p| p.score).collect();
        let agreement = if member_scores.len() > 1 {
            clamp_unit(1.0 - population_std(&member_scores))
        } else {
            1.0
        };

        let signal_values: Vec<f64> = signals.values().copied().collect();
        let disagreement = if signal_values.len() < 2 {
            0.0
        } else {
            round4((population_std(&signal_values) + spread(&signal_values)) / 2.0)
        };
        let needs_review =
            disagreement > DISAGREEMENT_THRESHOLD || agreement < MIN_AGREEMENT_FOR_CONFIDENCE;

        debug!(
            raw_score = final_score,
            agreement,
            disagreement,
            semantic_boost,
            "Ensemble combined member scores"
        );

        EnsembleResult {
            raw_score: round4(final_score),
            agreement: round4(agreement),
            signals,
            predictions,
            weights_used: snapshot.weights.clone(),
            semantic_boost: round4(semantic_boost),
            semantic_pattern,
            confidence_weighted_score: round4(confidence_score),
            disagreement_level: disagreement,
            needs_review,
        }
    }

    /// Share of each signal in the weighted score, using the weights the
    /// result was computed with. Empty when the weighted score is zero.
    pub fn model_contributions(&self, result: &EnsembleResult) -> BTreeMap<String, f64> {
        let weighted: BTreeMap<&String, f64> = result
            .signals
            .iter()
            .map(|(name, score)| {
                (name, score * result.weights_used.get(name).copied().unwrap_or(0.0))
            })
            .collect();
        let total: f64 = weighted.values().sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        weighted
            .into_iter()
            .map(|(name, value)| (name.clone(), round4(value / total)))
            .collect()
    }
}

impl Default for EnsembleCoordinator {
    fn default() -> Self {
        Self::new(default_members(), Arc::new(AdaptiveWeights::default()))
    }
}

/// Scores weighted by each member's share of the total confidence.
fn confidence_weighted(predictions: &[ModelPrediction]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    let total: f64 = predictions.iter().map(|p| p.confidence).sum();
    if total == 0.0 {
        return predictions.iter().map(|p| p.score).sum::<f64>() / predictions.len() as f64;
    }
    predictions
        .iter()
        .map(|p| p.score * p.confidence / total)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, f64, f64);

    impl EnsembleMember for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn predict(&self, _text: &str) -> ModelPrediction {
            ModelPrediction::new(self.0, self.1, self.2)
        }
    }

    fn fixed(members: &[(&'static str, f64, f64)]) -> EnsembleCoordinator {
        EnsembleCoordinator::new(
            members
                .iter()
                .map(|(n, s, c)| Arc::new(Fixed(n, *s, *c)) as Arc<dyn EnsembleMember>)
                .collect(),
            Arc::new(AdaptiveWeights::default()),
        )
    }

    #[test]
    fn test_unanimous_members_agree() {
        let ensemble = fixed(&[
            ("transformer", 0.2, 0.8),
            ("linear", 0.2, 0.8),
            ("rules", 0.2, 0.8),
        ]);
        let result = ensemble.predict("", None);

        assert_eq!(result.agreement, 1.0);
        // base 0.2 * 0.85, confidence 0.2, no boost
        assert!((result.raw_score - 0.182).abs() < 1e-9);
        assert_eq!(result.semantic_boost, 0.0);
        assert_eq!(result.signals.len(), 4);
        // semantic 0.0 vs members 0.2
        assert!(!result.needs_review);
    }

    #[test]
    fn test_split_members_need_review() {
        let ensemble = fixed(&[
            ("transformer", 0.95, 0.9),
            ("linear", 0.05, 0.9),
            ("rules", 0.5, 0.9),
        ]);
        let result = ensemble.predict("", None);
        assert!(result.disagreement_level > 0.3);
        assert!(result.needs_review);
    }

    #[test]
    fn test_domain_hint_raises_boost() {
        let ensemble = fixed(&[("transformer", 0.1, 0.8)]);
        let text = "Esse bandido safado criminoso mentiroso vigarista";
        let plain = ensemble.predict(text, None);
        let hinted = ensemble.predict(text, Some(Domain::Defamation));
        assert!(hinted.semantic_boost >= plain.semantic_boost);
        // the semantic signal itself is unaffected by the hint
        assert_eq!(hinted.signals[SEMANTIC_SIGNAL], plain.signals[SEMANTIC_SIGNAL]);
    }

    #[test]
    fn test_single_member_agreement() {
        let ensemble = fixed(&[("transformer", 0.7, 0.8)]);
        let result = ensemble.predict("", None);
        assert_eq!(result.agreement, 1.0);
        assert_eq!(result.member_scores(), vec![0.7]);
    }

    #[test]
    fn test_contributions_sum_to_one() {
        let ensemble = EnsembleCoordinator::default();
        let result = ensemble.predict("Denúncia de fraude e corrupção no tribunal", None);
        let contributions = ensemble.model_contributions(&result);
        let total: f64 = contributions.values().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_default_members_score_risky_text_higher() {
        let ensemble = EnsembleCoordinator::default();
        let benign = ensemble.predict("A reunião do clube foi adiada para sexta-feira.", None);
        let risky = ensemble.predict(
            "Investigação revela lavagem de dinheiro e propina no tribunal, crime grave",
            None,
        );
        assert!(risky.raw_score > benign.raw_score);
        assert_eq!(ensemble.member_names(), vec!["transformer", "linear", "rules"]);
    }
}
