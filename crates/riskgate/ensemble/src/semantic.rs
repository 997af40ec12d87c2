//! Lightweight semantic features and reference-pattern similarity.
//!
//! The embedding is a fixed 29-dimensional vector: five domain-vocabulary
//! scores, four context signals, and the first twenty term frequencies, L2
//! normalized. It is cheap enough to run on every request.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Domain vocabularies, kept sorted by key.
const DOMAIN_VOCABULARIES: [(&str, &[&str]); 5] = [
    (
        "defamation",
        &[
            "mentiroso", "corrupto", "ladrão", "criminoso", "bandido", "safado", "desonesto",
            "incompetente", "vagabundo", "vigarista", "golpista", "assassino", "estuprador",
            "pedófilo", "traficante",
        ],
    ),
    (
        "fraud",
        &[
            "fraude", "golpe", "esquema", "desvio", "lavagem", "propina", "suborno", "corrupção",
            "falsificação", "adulteração", "piramide", "estelionato", "apropriação",
            "superfaturamento", "licitação",
        ],
    ),
    (
        "impersonation",
        &[
            "oficial", "governo", "autoridade", "banco", "central", "receita", "federal",
            "polícia", "intimação", "notificação", "multa", "pendência", "regularize", "urgente",
            "bloqueio",
        ],
    ),
    (
        "misinformation",
        &[
            "fake", "falso", "mentira", "boato", "urgente", "compartilhe", "viralizar", "verdade",
            "censurado", "mídia", "manipulação", "conspiração", "oculto", "revelação", "exclusivo",
            "chocante",
        ],
    ),
    (
        "political",
        &[
            "presidente", "governador", "prefeito", "senador", "deputado", "ministro",
            "vereador", "partido", "eleição", "campanha", "votação", "urna", "tribunal", "stf",
            "tse", "congresso",
        ],
    ),
];

/// Context pattern groups, kept sorted by key.
const CONTEXT_PATTERNS: [(&str, &[&str]); 4] = [
    (
        "authority",
        &["oficial", "governo", "autoridade", "tribunal", "ministério"],
    ),
    (
        "call_to_action",
        &["compartilhe", "repasse", "espalhe", "divulgue", "retweet"],
    ),
    (
        "emotional",
        &["chocante", "absurdo", "inacreditável", "vergonha", "revolta"],
    ),
    (
        "urgency",
        &["urgente", "imediato", "agora", r"última\s+hora", "breaking"],
    ),
];

const STOPWORDS: &[&str] = &[
    "de", "a", "o", "que", "e", "do", "da", "em", "um", "para", "é", "com", "não", "uma", "os",
    "no", "se", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele", "das", "tem",
    "à", "seu", "sua", "ou", "ser",
];

const TERM_SLOTS: usize = 20;

const REFERENCE_TEXTS: [(&str, &str); 5] = [
    (
        "bank_fraud",
        "O Banco Central vai bloquear sua conta urgente regularize agora",
    ),
    (
        "political_attack",
        "O presidente corrupto mentiroso roubou dinheiro público",
    ),
    (
        "fake_news",
        "Urgente compartilhe antes que censurem a verdade chocante revelação",
    ),
    (
        "impersonation",
        "Notificação oficial do governo regularize sua pendência imediatamente",
    ),
    (
        "defamation",
        "Esse político safado bandido ladrão criminoso corrupto",
    ),
];

struct EmbedderPatterns {
    punctuation: Regex,
    context: Vec<(&'static str, Vec<Regex>)>,
}

fn embedder_patterns() -> &'static EmbedderPatterns {
    static PATTERNS: OnceLock<EmbedderPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| EmbedderPatterns {
        punctuation: Regex::new(r"[^\w\s]").expect("static punctuation pattern"),
        context: CONTEXT_PATTERNS
            .iter()
            .map(|(name, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("static context pattern"))
                    .collect();
                (*name, compiled)
            })
            .collect(),
    })
}

/// Embedding of one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f64>,
    pub tokens: Vec<String>,
    pub domain_scores: BTreeMap<String, f64>,
}

/// Stateless feature embedder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticEmbedder;

impl SemanticEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase, strip punctuation, drop stopwords and tokens of two chars or fewer.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = embedder_patterns().punctuation.replace_all(&lowered, " ");
        cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// Overlap with each domain vocabulary, boosted by overlap size.
    pub fn domain_scores(&self, tokens: &HashSet<&str>) -> BTreeMap<String, f64> {
        DOMAIN_VOCABULARIES
            .iter()
            .map(|(domain, vocab)| {
                let overlap = vocab.iter().filter(|w| tokens.contains(*w)).count() as f64;
                let score = overlap / vocab.len() as f64;
                (domain.to_string(), (score * (1.0 + 0.5 * overlap)).min(1.0))
            })
            .collect()
    }

    /// Fraction of each context group's patterns present in the text.
    pub fn context_signals(&self, text: &str) -> BTreeMap<String, f64> {
        let lowered = text.to_lowercase();
        embedder_patterns()
            .context
            .iter()
            .map(|(name, patterns)| {
                let matches = patterns.iter().filter(|p| p.is_match(&lowered)).count();
                (name.to_string(), (matches as f64 / patterns.len() as f64).min(1.0))
            })
            .collect()
    }

    pub fn embed(&self, text: &str) -> Embedding {
        let tokens = self.tokenize(text);
        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

        let domain_scores = self.domain_scores(&token_set);
        let context = self.context_signals(text);

        // Term frequencies in first-occurrence order.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for token in &tokens {
            let count = counts.entry(token.as_str()).or_insert(0);
            if *count == 0 {
                order.push(token.as_str());
            }
            *count += 1;
        }
        let total = tokens.len().max(1) as f64;

        let mut vector: Vec<f64> = domain_scores.values().copied().collect();
        vector.extend(context.values().copied());
        vector.extend(
            order
                .iter()
                .take(TERM_SLOTS)
                .map(|t| counts[t] as f64 / total),
        );
        vector.resize(DOMAIN_VOCABULARIES.len() + CONTEXT_PATTERNS.len() + TERM_SLOTS, 0.0);

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        Embedding {
            vector,
            tokens,
            domain_scores,
        }
    }

    /// Highest-scoring domain vocabulary, or `general` when nothing overlaps.
    pub fn dominant_domain(&self, text: &str) -> (String, f64) {
        let embedding = self.embed(text);
        embedding
            .domain_scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .fold(None, |best: Option<(String, f64)>, (domain, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((domain, score)),
            })
            .unwrap_or_else(|| ("general".to_string(), 0.0))
    }
}

/// Similarity of a text against the reference patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub score: f64,
    pub matched_concepts: Vec<String>,
    pub semantic_distance: f64,
    pub confidence: f64,
}

/// Cosine similarity against five fixed reference-attack embeddings.
#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    embedder: SemanticEmbedder,
    references: Vec<(&'static str, Vec<f64>)>,
}

impl SimilarityMatcher {
    pub fn new(embedder: SemanticEmbedder) -> Self {
        let references = REFERENCE_TEXTS
            .iter()
            .map(|(name, text)| (*name, embedder.embed(text).vector))
            .collect();
        Self {
            embedder,
            references,
        }
    }

    pub fn embedder(&self) -> &SemanticEmbedder {
        &self.embedder
    }

    /// Non-negative similarity to every reference pattern.
    pub fn match_against_references(&self, text: &str) -> BTreeMap<String, f64> {
        let vector = self.embedder.embed(text).vector;
        self.references
            .iter()
            .map(|(name, reference)| (name.to_string(), cosine_similarity(&vector, reference).max(0.0)))
            .collect()
    }

    /// Boost and the best-matching pattern name (`none` when no boost).
    pub fn compute_risk_boost(&self, text: &str) -> (f64, String) {
        let best = self
            .match_against_references(text)
            .into_iter()
            .fold(None, |best: Option<(String, f64)>, (name, sim)| match best {
                Some((_, best_sim)) if best_sim >= sim => best,
                _ => Some((name, sim)),
            });

        let Some((pattern, similarity)) = best else {
            return (0.0, "none".to_string());
        };

        let boost = if similarity > 0.7 {
            0.3
        } else if similarity > 0.5 {
            0.2
        } else if similarity > 0.3 {
            0.1
        } else {
            0.0
        };

        if boost > 0.0 {
            (boost, pattern)
        } else {
            (0.0, "none".to_string())
        }
    }

    /// Reference patterns at or above `threshold`.
    pub fn find_similar(&self, text: &str, threshold: f64) -> SimilarityMatch {
        let similarities = self.match_against_references(text);
        let matched: Vec<String> = similarities
            .iter()
            .filter(|(_, sim)| **sim >= threshold)
            .map(|(name, _)| name.clone())
            .collect();
        let max_sim = similarities.values().copied().fold(0.0, f64::max);
        let confidence = if matched.is_empty() {
            0.5
        } else {
            (max_sim * 1.2).min(1.0)
        };

        SimilarityMatch {
            score: max_sim,
            matched_concepts: matched,
            semantic_distance: 1.0 - max_sim,
            confidence,
        }
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(SemanticEmbedder)
    }
}

/// Cosine similarity; 0 when either vector is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_unit_length() {
        let embedding = SemanticEmbedder.embed("O presidente corrupto mentiroso roubou dinheiro");
        assert_eq!(embedding.vector.len(), 29);
        let norm: f64 = embedding.vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_embeds_to_zero() {
        let embedding = SemanticEmbedder.embed("");
        assert!(embedding.vector.iter().all(|v| *v == 0.0));
        assert!(embedding.tokens.is_empty());
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        let tokens = SemanticEmbedder.tokenize("O prefeito, de novo, foi ao STF!");
        assert_eq!(tokens, vec!["prefeito", "novo", "stf"]);
    }

    #[test]
    fn test_dominant_domain() {
        let (domain, score) =
            SemanticEmbedder.dominant_domain("Esse bandido safado e criminoso mentiroso");
        assert_eq!(domain, "defamation");
        assert!(score > 0.0);

        let (domain, score) = SemanticEmbedder.dominant_domain("bom dia");
        assert_eq!(domain, "general");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_reference_text_gets_full_boost() {
        let matcher = SimilarityMatcher::default();
        let (boost, pattern) =
            matcher.compute_risk_boost("Esse político safado bandido ladrão criminoso corrupto");
        assert_eq!(boost, 0.3);
        assert_eq!(pattern, "defamation");
    }

    #[test]
    fn test_unrelated_text_gets_no_boost() {
        let matcher = SimilarityMatcher::default();
        let (boost, pattern) = matcher.compute_risk_boost("");
        assert_eq!(boost, 0.0);
        assert_eq!(pattern, "none");
    }

    #[test]
    fn test_find_similar() {
        let matcher = SimilarityMatcher::default();
        let result = matcher.find_similar(
            "Notificação oficial do governo regularize sua pendência imediatamente",
            0.5,
        );
        assert!(result.matched_concepts.contains(&"impersonation".to_string()));
        assert!((result.score - 1.0).abs() < 1e-9);
        assert!(result.semantic_distance.abs() < 1e-9);
    }
}
