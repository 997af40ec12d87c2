//! Default keyword-lexicon domain classifiers.
//!
//! These let the pipeline run without external models. Each one obeys the
//! [`DomainClassifier`] contract and can be swapped out per domain through
//! [`ClassifierSet::with_classifier`].

use std::sync::Arc;

use regex::Regex;

use riskgate_types::stats::{clamp_unit, population_std, round4};
use riskgate_types::{ClassifierOutput, Domain, DomainClassifier, Signal};

/// Version stamped on every built-in lexicon.
pub const LEXICON_VERSION: &str = "1.0.0";

/// Short stable fingerprint of a model name and version.
pub fn model_hash(name: &str, version: &str) -> String {
    let digest = blake3::hash(format!("{name}:{version}").as_bytes());
    digest.to_hex().as_str()[..16].to_string()
}

type Lexicon = &'static [(&'static str, f64, &'static str)];
type Intensifiers = &'static [(&'static str, f64)];

const NO_INTENSIFIERS: Intensifiers = &[];

const GENERAL_LEXICON: Lexicon = &[
    (r"\b(corrup[çc][ãa]o|suborno|propina|lavagem|bribery|kickback)\b", 0.9, "high_risk"),
    (r"\b(fraude|desvio|superfaturamento|embezzlement)\b", 0.85, "high_risk"),
    (r"\b(improbidade|enriquecimento il[íi]cito)\b", 0.88, "high_risk"),
    (r"\b(organiza[çc][ãa]o criminosa|quadrilha)\b", 0.92, "high_risk"),
    (r"\b(peculato|prevarica[çc][ãa]o)\b", 0.87, "high_risk"),
    (r"\b(investiga[çc][ãa]o|den[úu]ncia|acusa[çc][ãa]o)\b", 0.6, "medium_risk"),
    (r"\b(suspeita|irregularidade|infra[çc][ãa]o)\b", 0.55, "medium_risk"),
    (r"\b(conflito de interesse|nepotismo)\b", 0.65, "medium_risk"),
    (r"\b(licita[çc][ãa]o|contrato p[úu]blico)\b", 0.5, "medium_risk"),
    (r"\b(processo|procedimento|administrativo)\b", 0.3, "low_risk"),
    (r"\b(servidor|funcion[áa]rio|cargo)\b", 0.25, "low_risk"),
    (r"\b([óo]rg[ãa]o|institui[çc][ãa]o|entidade)\b", 0.2, "low_risk"),
];

const POLITICAL_LEXICON: Lexicon = &[
    (r"\b(fraude eleitoral|urnas? fraudadas?|election fraud|rigged election)\b", 0.9, "electoral_fraud"),
    (r"\b(golpe de estado|golpe militar|interven[çc][ãa]o militar|coup)\b", 0.92, "institutional_attack"),
    (r"\bfechar o (stf|congresso|supremo)\b", 0.9, "institutional_attack"),
    (r"\b(compra de votos|caixa dois|vote buying)\b", 0.88, "electoral_crime"),
    (r"\b(candidat[oa]|elei[çc][ãa]o|elei[çc][õo]es|campanha eleitoral|election|campaign)\b", 0.45, "electoral_context"),
    (r"\b(deputad[oa]|senador[a]?|prefeit[oa]|governador[a]?|presidente|ministr[oa]|senator|governor|mayor)\b", 0.35, "public_official"),
    (r"\b(partido|coliga[çc][ãa]o|party)\b", 0.3, "party"),
];

const DEFAMATION_LEXICON: Lexicon = &[
    (r"\b(mentiroso|corrupto|ladr[ãa]o|criminoso)\b", 0.85, "direct_insult"),
    (r"\b(incompetente|in[úu]til|vagabundo)\b", 0.75, "personal_attack"),
    (r"\b(assassino|estuprador|ped[óo]filo)\b", 0.95, "grave_accusation"),
    (r"\b(safado|desonesto|vigarista|golpista)\b", 0.8, "honor_attack"),
    (r"\b(bandido|marginal|traficante)\b", 0.88, "criminal_accusation"),
    (r"\b(fracos|med[íi]ocres|pat[ée]ticos)\b", 0.65, "belittling"),
    (r"\b(roubou|furtou|desviou)\s+\w+", 0.82, "crime_accusation"),
    (r"(n[ãa]o\s+tem\s+moral|sem\s+vergonha)", 0.7, "reputation_attack"),
];

const DEFAMATION_INTENSIFIERS: Intensifiers = &[
    (r"\b(sempre|nunca|todos|ningu[ée]m)\b", 0.1),
    (r"\b(comprovadamente|claramente|obviamente)\b", 0.15),
    (r"(!{2,}|\?{2,})", 0.05),
];

const MISINFORMATION_LEXICON: Lexicon = &[
    (r"(compartilhe antes que apaguem|share before (they|it gets) delete)", 0.85, "viral_urgency"),
    (r"(a m[íi]dia (esconde|n[ãa]o mostra)|o que eles n[ãa]o querem que voc[êe] saiba|they don't want you to know)", 0.8, "conspiracy"),
    (r"\b(cura milagrosa|miracle cure|100% comprovado|comprovado cientificamente)\b", 0.82, "false_authority"),
    (r"\b(fake news|boato|hoax)\b", 0.55, "disputed_claim"),
    (r"\b(urgente|bomba|breaking)\b", 0.5, "sensational"),
];

const MISINFORMATION_INTENSIFIERS: Intensifiers = &[
    (r"\b(todos|ningu[ée]m|everyone|nobody)\b", 0.1),
    (r"(!{2,})", 0.05),
];

const IMPERSONATION_LEXICON: Lexicon = &[
    (r"\bsou (o|a) (presidente|ministr[oa]|governador[a]?|juiz[a]?|delegad[oa])\b", 0.9, "authority_claim"),
    (r"\b(envie (seus dados|sua senha|o c[óo]digo)|confirme seus dados|send your password|verify your account)\b", 0.92, "credential_phishing"),
    (r"\b(pix|transfer[êe]ncia) (urgente|imediat[oa])\b", 0.85, "payment_pressure"),
    (r"\b(perfil oficial|conta oficial|official account)\b", 0.65, "account_claim"),
    (r"\b(comunicado oficial|nota oficial|official statement)\b", 0.6, "official_tone"),
];

/// How a classifier derives its confidence from the signals it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfidenceRule {
    /// Signal density bonus minus weight-variance penalty.
    Density,
    /// Fixed steps by number of signals.
    SignalCount,
}

struct LexiconEntry {
    pattern: Regex,
    weight: f64,
    category: &'static str,
}

/// Keyword-lexicon scorer for one domain.
pub struct LexiconClassifier {
    name: &'static str,
    domain: Domain,
    model_hash: String,
    entries: Vec<LexiconEntry>,
    intensifiers: Vec<(Regex, f64)>,
    context_radius: usize,
    confidence_rule: ConfidenceRule,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("static lexicon pattern")
}

impl LexiconClassifier {
    /// Built-in lexicon for a domain.
    pub fn for_domain(domain: Domain) -> Self {
        let (name, lexicon, intensifiers, context_radius, confidence_rule) = match domain {
            Domain::General => (
                "risk-classifier",
                GENERAL_LEXICON,
                NO_INTENSIFIERS,
                30,
                ConfidenceRule::Density,
            ),
            Domain::Political => (
                "political-classifier",
                POLITICAL_LEXICON,
                NO_INTENSIFIERS,
                30,
                ConfidenceRule::Density,
            ),
            Domain::Defamation => (
                "defamation-detector",
                DEFAMATION_LEXICON,
                DEFAMATION_INTENSIFIERS,
                40,
                ConfidenceRule::SignalCount,
            ),
            Domain::Misinformation => (
                "misinformation-detector",
                MISINFORMATION_LEXICON,
                MISINFORMATION_INTENSIFIERS,
                40,
                ConfidenceRule::SignalCount,
            ),
            Domain::Impersonation => (
                "impersonation-detector",
                IMPERSONATION_LEXICON,
                NO_INTENSIFIERS,
                40,
                ConfidenceRule::SignalCount,
            ),
        };

        Self {
            name,
            domain,
            model_hash: model_hash(name, LEXICON_VERSION),
            entries: lexicon
                .iter()
                .map(|(pattern, weight, category)| LexiconEntry {
                    pattern: compile(pattern),
                    weight: *weight,
                    category: *category,
                })
                .collect(),
            intensifiers: intensifiers
                .iter()
                .map(|(pattern, bonus)| (compile(pattern), *bonus))
                .collect(),
            context_radius,
            confidence_rule,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn model_hash(&self) -> &str {
        &self.model_hash
    }

    fn extract_signals(&self, text: &str) -> Vec<Signal> {
        let mut signals = Vec::new();
        for entry in &self.entries {
            for found in entry.pattern.find_iter(text) {
                signals.push(Signal {
                    term: found.as_str().to_lowercase(),
                    weight: entry.weight,
                    position: text[..found.start()].chars().count(),
                    context: format!(
                        "[{}] {}",
                        entry.category,
                        context_window(text, found.start(), found.end(), self.context_radius)
                    ),
                });
            }
        }
        signals.sort_by_key(|s| s.position);
        signals
    }

    fn confidence(&self, signals: &[Signal], char_count: usize) -> f64 {
        match self.confidence_rule {
            ConfidenceRule::Density => {
                if signals.is_empty() {
                    return 0.95;
                }
                let density = signals.len() as f64 / (char_count as f64 / 100.0).max(1.0);
                let weights: Vec<f64> = signals.iter().map(|s| s.weight).collect();
                let variance = population_std(&weights).powi(2);
                (0.85 + (density * 0.1).min(0.1) - variance * 0.2).clamp(0.5, 0.99)
            }
            ConfidenceRule::SignalCount => match signals.len() {
                0 => 0.92,
                1 => 0.85,
                2..=3 => 0.88,
                _ => 0.9,
            },
        }
    }
}

impl DomainClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        self.name
    }

    fn score(&self, text: &str) -> ClassifierOutput {
        let signals = self.extract_signals(text);

        let score = if signals.is_empty() {
            0.05
        } else {
            let strongest = signals.iter().map(|s| s.weight).fold(0.0, f64::max);
            let bonus: f64 = self
                .intensifiers
                .iter()
                .filter(|(pattern, _)| pattern.is_match(text))
                .map(|(_, bonus)| bonus)
                .sum();
            clamp_unit(strongest + bonus * 0.5)
        };
        let confidence = self.confidence(&signals, text.chars().count());

        ClassifierOutput {
            score: round4(score),
            confidence: round4(confidence),
            signals,
            model_version: LEXICON_VERSION.to_string(),
            model_hash: self.model_hash.clone(),
        }
    }
}

/// `radius` characters either side of a match, quoted with ellipses.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(idx, _)| idx);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(idx, _)| end + idx);
    format!("...{}...", &text[lo..hi])
}

/// One classifier per domain.
#[derive(Clone)]
pub struct ClassifierSet {
    general: Arc<dyn DomainClassifier>,
    political: Arc<dyn DomainClassifier>,
    defamation: Arc<dyn DomainClassifier>,
    misinformation: Arc<dyn DomainClassifier>,
    impersonation: Arc<dyn DomainClassifier>,
}

impl ClassifierSet {
    /// Built-in lexicon classifiers for every domain.
    pub fn lexicon() -> Self {
        let build = |domain| Arc::new(LexiconClassifier::for_domain(domain)) as Arc<dyn DomainClassifier>;
        Self {
            general: build(Domain::General),
            political: build(Domain::Political),
            defamation: build(Domain::Defamation),
            misinformation: build(Domain::Misinformation),
            impersonation: build(Domain::Impersonation),
        }
    }

    /// Replace the classifier for one domain.
    pub fn with_classifier(mut self, domain: Domain, classifier: Arc<dyn DomainClassifier>) -> Self {
        *self.slot_mut(domain) = classifier;
        self
    }

    /// Classifier responsible for a domain.
    pub fn for_domain(&self, domain: Domain) -> &Arc<dyn DomainClassifier> {
        match domain {
            Domain::General => &self.general,
            Domain::Political => &self.political,
            Domain::Defamation => &self.defamation,
            Domain::Misinformation => &self.misinformation,
            Domain::Impersonation => &self.impersonation,
        }
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut Arc<dyn DomainClassifier> {
        match domain {
            Domain::General => &mut self.general,
            Domain::Political => &mut self.political,
            Domain::Defamation => &mut self.defamation,
            Domain::Misinformation => &mut self.misinformation,
            Domain::Impersonation => &mut self.impersonation,
        }
    }
}

impl Default for ClassifierSet {
    fn default() -> Self {
        Self::lexicon()
    }
}

impl std::fmt::Debug for ClassifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSet")
            .field("general", &self.general.name())
            .field("political", &self.political.name())
            .field("defamation", &self.defamation.name())
            .field("misinformation", &self.misinformation.name())
            .field("impersonation", &self.impersonation.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_lexicon_compiles() {
        for domain in Domain::ALL {
            let classifier = LexiconClassifier::for_domain(domain);
            assert_eq!(classifier.domain(), domain);
            assert_eq!(classifier.model_hash().len(), 16);
        }
    }

    #[test]
    fn test_benign_text_baseline() {
        let classifier = LexiconClassifier::for_domain(Domain::General);
        let output = classifier.score("O tempo hoje está ensolarado e agradável.");
        assert_eq!(output.score, 0.05);
        assert_eq!(output.confidence, 0.95);
        assert!(output.signals.is_empty());
        assert_eq!(output.model_version, LEXICON_VERSION);
    }

    #[test]
    fn test_general_takes_strongest_signal() {
        let classifier = LexiconClassifier::for_domain(Domain::General);
        let output = classifier.score("Há suspeita de corrupção no contrato público da prefeitura.");
        assert_eq!(output.score, 0.9);
        assert!(output.signals.iter().any(|s| s.term == "corrupção"));
        assert!(output.confidence >= 0.5 && output.confidence <= 0.99);
    }

    #[test]
    fn test_signal_position_counts_characters() {
        let classifier = LexiconClassifier::for_domain(Domain::General);
        let output = classifier.score("ação é propina");
        let signal = output
            .signals
            .iter()
            .find(|s| s.term == "propina")
            .unwrap();
        assert_eq!(signal.position, 7);
        assert!(signal.context.starts_with("[high_risk] ..."));
    }

    #[test]
    fn test_defamation_intensifiers_raise_score() {
        let classifier = LexiconClassifier::for_domain(Domain::Defamation);
        let plain = classifier.score("Ele é desonesto.");
        let intensified = classifier.score("Ele é obviamente desonesto!!");
        assert_eq!(plain.score, 0.8);
        assert_eq!(intensified.score, 0.9);
        assert_eq!(plain.confidence, 0.85);
    }

    #[test]
    fn test_model_hash_is_stable() {
        assert_eq!(model_hash("risk-classifier", "1.0.0"), model_hash("risk-classifier", "1.0.0"));
        assert_ne!(model_hash("risk-classifier", "1.0.0"), model_hash("risk-classifier", "1.0.1"));
        assert!(model_hash("a", "b").chars().all(|c| c.is_ascii_hexdigit()));
    }

    struct Constant;

    impl DomainClassifier for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn score(&self, _text: &str) -> ClassifierOutput {
            ClassifierOutput {
                score: 0.5,
                confidence: 0.5,
                signals: Vec::new(),
                model_version: "0".into(),
                model_hash: "0".into(),
            }
        }
    }

    #[test]
    fn test_set_replaces_single_domain() {
        let set = ClassifierSet::lexicon().with_classifier(Domain::Political, Arc::new(Constant));
        assert_eq!(set.for_domain(Domain::Political).name(), "constant");
        assert_eq!(set.for_domain(Domain::General).name(), "risk-classifier");
        assert_eq!(set.for_domain(Domain::Defamation).name(), "defamation-detector");
    }
}
