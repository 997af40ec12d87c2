//! Built-in ensemble members.
//!
//! Each member is a stateless function of the text. Members hold only
//! compiled patterns, so they can be shared across threads and abandoned
//! mid-call without leaving anything behind.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use riskgate_types::stats::{clamp_unit, round4};
use riskgate_types::ModelPrediction;

/// One independent scoring model.
pub trait EnsembleMember: Send + Sync {
    /// Name used as the signal and weight key.
    fn name(&self) -> &str;

    /// Score the text.
    fn predict(&self, text: &str) -> ModelPrediction;
}

/// The three built-in members in their canonical order.
pub fn default_members() -> Vec<Arc<dyn EnsembleMember>> {
    vec![
        Arc::new(TransformerModel),
        Arc::new(LinearModel),
        Arc::new(RulesModel),
    ]
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static member pattern")
}

type Category = (&'static str, Vec<(Regex, f64)>);

fn semantic_categories() -> &'static [Category] {
    static CATEGORIES: OnceLock<Vec<Category>> = OnceLock::new();
    CATEGORIES.get_or_init(|| {
        vec![
            (
                "corruption",
                vec![
                    (compile(r"corrup[çc][ãa]o|suborno|propina|bribery|kickback"), 0.9),
                    (compile(r"lavagem\s+de\s+dinheiro|money\s+laundering"), 0.92),
                    (compile(r"desvio\s+(de\s+)?(verba|dinheiro|recursos)"), 0.88),
                ],
            ),
            (
                "fraud",
                vec![
                    (compile(r"fraude|falsifica[çc][ãa]o|adultera[çc][ãa]o|fraud|forgery"), 0.85),
                    (compile(r"documento\s+falso|assinatura\s+falsa"), 0.87),
                ],
            ),
            (
                "abuse",
                vec![
                    (compile(r"abuso\s+de\s+(poder|autoridade)|abuse\s+of\s+power"), 0.86),
                    (compile(r"improbidade|enriquecimento\s+il[íi]cito"), 0.89),
                ],
            ),
        ]
    })
}

/// Pattern-category scorer standing in for a transformer classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformerModel;

impl EnsembleMember for TransformerModel {
    fn name(&self) -> &str {
        "transformer"
    }

    fn predict(&self, text: &str) -> ModelPrediction {
        let lowered = text.to_lowercase();
        let mut features = BTreeMap::new();
        let mut max_score: f64 = 0.0;

        for (category, patterns) in semantic_categories() {
            let category_score = patterns
                .iter()
                .filter(|(pattern, _)| pattern.is_match(&lowered))
                .map(|(_, weight)| *weight)
                .fold(0.0, f64::max);
            features.insert(category.to_string(), round3(category_score));
            max_score = max_score.max(category_score);
        }

        let (score, confidence) = if max_score == 0.0 {
            (0.1, 0.85)
        } else {
            (max_score, 0.75 + max_score * 0.2)
        };

        ModelPrediction::new(self.name(), round4(score), round4(confidence)).with_features(features)
    }
}

const LINEAR_FEATURE_WEIGHTS: [(&str, f64); 4] = [
    ("risk_keywords", 0.4),
    ("entity_density", 0.2),
    ("sentiment_negative", 0.25),
    ("text_complexity", 0.15),
];

const RISK_KEYWORDS: &[&str] = &[
    "fraude",
    "corrupção",
    "desvio",
    "crime",
    "ilegal",
    "irregular",
    "suspeita",
    "denúncia",
    "investigação",
];

const NEGATIVE_WORDS: &[&str] = &["não", "nunca", "crime", "fraude", "corrupção", "ilegal"];

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b"))
}

/// Feature-weighted linear baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearModel;

impl EnsembleMember for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, text: &str) -> ModelPrediction {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut features = BTreeMap::new();

        let keyword_count = RISK_KEYWORDS.iter().filter(|kw| lowered.contains(*kw)).count();
        features.insert("risk_keywords".to_string(), (keyword_count as f64 / 5.0).min(1.0));

        let entities = entity_pattern().find_iter(text).count();
        let density_base = (words.len() as f64 / 10.0).max(1.0);
        features.insert(
            "entity_density".to_string(),
            (entities as f64 / density_base).min(1.0),
        );

        let negative_count = NEGATIVE_WORDS.iter().filter(|w| lowered.contains(*w)).count();
        features.insert(
            "sentiment_negative".to_string(),
            (negative_count as f64 / 3.0).min(1.0),
        );

        let avg_word_len = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
        };
        features.insert("text_complexity".to_string(), (avg_word_len / 10.0).min(1.0));

        let score: f64 = LINEAR_FEATURE_WEIGHTS
            .iter()
            .map(|(name, weight)| features.get(*name).copied().unwrap_or(0.0) * weight)
            .sum();

        let features = features.into_iter().map(|(k, v)| (k, round3(v))).collect();
        ModelPrediction::new(self.name(), round4(clamp_unit(score)), 0.80).with_features(features)
    }
}

fn legal_rules() -> &'static [(Regex, f64, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, f64, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"artigo\s+\d+", 0.3, "legal_reference"),
            (r"lei\s+(n[°º]?\s*)?\d+", 0.35, "law_reference"),
            (r"decreto|portaria|resolu[çc][ãa]o", 0.25, "decree_reference"),
            (r"tribunal|justi[çc]a|ministério\s+público", 0.4, "judicial_reference"),
            (r"crime|delito|infra[çc][ãa]o", 0.5, "criminal_term"),
            (r"pena|condena[çc][ãa]o|senten[çc]a", 0.45, "penalty_term"),
        ]
        .into_iter()
        .map(|(pattern, weight, name)| (compile(pattern), weight, name))
        .collect()
    })
}

/// Legal-reference rule detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesModel;

impl EnsembleMember for RulesModel {
    fn name(&self) -> &str {
        "rules"
    }

    fn predict(&self, text: &str) -> ModelPrediction {
        let lowered = text.to_lowercase();
        let mut features = BTreeMap::new();
        let mut total = 0.0;

        for (pattern, weight, name) in legal_rules() {
            if pattern.is_match(&lowered) {
                features.insert(name.to_string(), *weight);
                total += weight;
            }
        }

        let matches = features.len();
        let (score, confidence) = if matches > 0 {
            ((total / (matches as f64 + 1.0)).min(1.0), 0.95)
        } else {
            (0.1, 0.7)
        };

        ModelPrediction::new(self.name(), round4(score), confidence).with_features(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_baseline_without_patterns() {
        let prediction = TransformerModel.predict("A reunião foi adiada para a próxima semana.");
        assert_eq!(prediction.score, 0.1);
        assert_eq!(prediction.confidence, 0.85);
        assert_eq!(prediction.features["corruption"], 0.0);
    }

    #[test]
    fn test_transformer_takes_strongest_category() {
        let prediction = TransformerModel.predict("Investigação aponta lavagem de dinheiro e fraude");
        assert_eq!(prediction.score, 0.92);
        assert_eq!(prediction.features["fraud"], 0.85);
        assert!((prediction.confidence - 0.934).abs() < 1e-9);
    }

    #[test]
    fn test_linear_features_are_bounded() {
        let prediction =
            LinearModel.predict("Denúncia de fraude e corrupção: crime ilegal sob investigação");
        assert!(prediction.score > 0.3);
        assert!(prediction.score <= 1.0);
        assert_eq!(prediction.confidence, 0.8);
        assert_eq!(prediction.features["risk_keywords"], 1.0);
        assert_eq!(prediction.features.len(), 4);
    }

    #[test]
    fn test_linear_empty_text() {
        let prediction = LinearModel.predict("");
        assert_eq!(prediction.score, 0.0);
    }

    #[test]
    fn test_rules_average_with_smoothing() {
        let prediction = RulesModel.predict("O tribunal confirmou a condenação pelo crime");
        // judicial 0.4 + criminal 0.5 + penalty 0.45 over 3 + 1
        assert!((prediction.score - 0.3375).abs() < 1e-9);
        assert_eq!(prediction.confidence, 0.95);
        assert_eq!(prediction.features.len(), 3);

        let none = RulesModel.predict("Bom dia a todos");
        assert_eq!(none.score, 0.1);
        assert_eq!(none.confidence, 0.7);
    }

    #[test]
    fn test_default_members_order() {
        let names: Vec<String> = default_members().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["transformer", "linear", "rules"]);
    }
}
