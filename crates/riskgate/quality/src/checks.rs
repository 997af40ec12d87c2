//! Individual quality checks.
//!
//! Each check is a pure function of the text, except duplicate detection
//! which lives in [`crate::dedup`].

use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::report::IssueCode;

const PT_BR_COMMON_WORDS: &[&str] = &[
    "que", "de", "não", "para", "com", "uma", "os", "no", "se", "na", "por", "mais", "como",
    "mas", "foi", "ao", "ele", "das", "tem", "à", "seu", "sua", "ou", "ser", "quando", "muito",
    "há", "nos", "já", "está", "eu", "também", "só", "pelo", "pela", "até", "isso", "ela",
    "entre", "era", "depois", "sem", "mesmo", "aos", "ter", "seus", "quem",
];

const EN_COMMON_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as",
    "this", "that", "these", "those", "it", "he", "she", "they", "we", "and", "or", "but", "if",
    "while", "because", "so", "not", "all",
];

/// Words sampled: the ratio denominator is capped at this size.
const LANGUAGE_SAMPLE_SIZE: usize = 50;
const MIN_LANGUAGE_RATIO: f64 = 0.1;

/// Texts longer than this must end in terminal punctuation.
const PUNCTUATION_REQUIRED_AFTER: usize = 100;

const SPECIAL_CHARS: &[char] = &['!', '?', '@', '#', '$', '%', '&', '*'];
const MAX_SPECIAL_RATIO: f64 = 0.1;
const MIN_UNIQUE_WORD_RATIO: f64 = 0.3;
const MAX_URLS: usize = 5;

struct Patterns {
    word: Regex,
    whitespace: Regex,
    url: Regex,
    truncation: Vec<(Regex, &'static str)>,
    public_entities: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("static quality pattern");
        Patterns {
            word: compile(r"\b\w+\b"),
            whitespace: compile(r"\s+"),
            url: compile(r"https?://\S+"),
            truncation: [
                (r"\.\.\.$", "ellipsis"),
                (r"…$", "unicode_ellipsis"),
                (r"(?i)\[continua\]", "continua_marker"),
                (r"(?i)\[truncado\]", "truncado_marker"),
                (r"(?i)\[continued\]", "continued_marker"),
                (r"(?i)\[truncated\]", "truncated_marker"),
                (r"\[\.{3}\]$", "bracketed_ellipsis"),
            ]
            .into_iter()
            .map(|(p, name)| (compile(p), name))
            .collect(),
            public_entities: [
                r"(?i)\b(prefeito|governador|presidente|senador|deputado|ministro)\b",
                r"(?i)\b(vereador|juiz|promotor|procurador|delegado|secretário)\b",
                r"(?i)\b(prefeitura|câmara|senado|governo|ministério|tribunal)\b",
                r"\b(STF|STJ|TSE|TCU|CGU|MPF|IBGE|INSS)\b",
                r"(?i)\b(mayor|governor|president|senator|minister|judge|prosecutor)\b",
            ]
            .into_iter()
            .map(compile)
            .collect(),
        }
    })
}

/// Lowercase, collapse whitespace, trim.
pub fn normalize(text: &str) -> String {
    patterns()
        .whitespace
        .replace_all(text.to_lowercase().trim(), " ")
        .into_owned()
}

/// blake3 hex digest of the normalized text.
pub fn content_hash(text: &str) -> String {
    blake3::hash(normalize(text).as_bytes()).to_hex().to_string()
}

/// Language plausibility: `(valid, ratio)`.
///
/// The ratio is recognized common words over the distinct words of the
/// text, with the denominator capped at the sample size.
pub fn check_language(text: &str) -> (bool, f64) {
    let lowered = text.to_lowercase();
    let words: HashSet<&str> = patterns()
        .word
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();

    if words.is_empty() {
        return (false, 0.0);
    }

    let pt = words.iter().filter(|w| PT_BR_COMMON_WORDS.contains(w)).count();
    let en = words.iter().filter(|w| EN_COMMON_WORDS.contains(w)).count();
    let ratio = (pt + en) as f64 / words.len().min(LANGUAGE_SAMPLE_SIZE) as f64;

    (ratio >= MIN_LANGUAGE_RATIO, riskgate_types::stats::round4(ratio))
}

/// Character and word counts.
pub fn measure_length(text: &str) -> (usize, usize) {
    (text.chars().count(), text.split_whitespace().count())
}

/// Truncation detection: the matched marker name, if any.
pub fn check_truncation(text: &str) -> Option<&'static str> {
    for (pattern, name) in &patterns().truncation {
        if pattern.is_match(text) {
            return Some(name);
        }
    }

    let trimmed = text.trim();
    if text.chars().count() > PUNCTUATION_REQUIRED_AFTER
        && !trimmed.ends_with(&['.', '!', '?'][..])
    {
        return Some("no_ending_punctuation");
    }

    None
}

/// Mentions of public officials and institutions, deduplicated and lowercased.
pub fn find_public_entities(text: &str) -> Vec<String> {
    let mut found = BTreeSet::new();
    for pattern in &patterns().public_entities {
        for m in pattern.find_iter(text) {
            found.insert(m.as_str().to_lowercase());
        }
    }
    found.into_iter().collect()
}

/// True when the text has cased letters and none of them are lowercase.
fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Content heuristics: `(sub-score, issues)` with each issue's penalty applied.
pub fn check_content_quality(text: &str) -> (f64, Vec<IssueCode>) {
    let mut issues = Vec::new();
    let mut score: f64 = 1.0;

    if is_all_caps(text) {
        issues.push(IssueCode::AllCaps);
        score -= 0.1;
    }

    let char_count = text.chars().count().max(1);
    let special = text.chars().filter(|c| SPECIAL_CHARS.contains(c)).count();
    if special as f64 / char_count as f64 > MAX_SPECIAL_RATIO {
        issues.push(IssueCode::ExcessiveSpecialChars);
        score -= 0.15;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if !words.is_empty() {
        let unique: HashSet<&str> = words.iter().copied().collect();
        if (unique.len() as f64 / words.len() as f64) < MIN_UNIQUE_WORD_RATIO {
            issues.push(IssueCode::RepetitiveContent);
            score -= 0.2;
        }
    }

    if patterns().url.find_iter(text).count() > MAX_URLS {
        issues.push(IssueCode::ExcessiveUrls);
        score -= 0.1;
    }

    (score.max(0.0), issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_accepts_portuguese_and_english() {
        let (valid, ratio) = check_language("O prefeito não foi para a reunião com os vereadores");
        assert!(valid);
        assert!(ratio > 0.1);

        let (valid, _) = check_language("The committee approved the budget");
        assert!(valid);
    }

    #[test]
    fn test_language_rejects_symbols() {
        assert_eq!(check_language("#$%&*!?@"), (false, 0.0));
        let (valid, _) = check_language("xqzt vbrrk plomf dwarg");
        assert!(!valid);
    }

    #[test]
    fn test_truncation_markers() {
        assert_eq!(check_truncation("A frase termina assim..."), Some("ellipsis"));
        assert_eq!(
            check_truncation("Leia a matéria completa [continua]"),
            Some("continua_marker")
        );
        let long = "word ".repeat(30);
        assert_eq!(check_truncation(&long), Some("no_ending_punctuation"));
        assert_eq!(check_truncation("Short text without a period"), None);
    }

    #[test]
    fn test_content_quality_flags() {
        let (score, issues) = check_content_quality("THIS IS ALL CAPS TEXT");
        assert_eq!(issues, vec![IssueCode::AllCaps]);
        assert!((score - 0.9).abs() < 1e-9);

        let (_, issues) = check_content_quality("spam spam spam spam spam spam spam spam spam spam");
        assert!(issues.contains(&IssueCode::RepetitiveContent));

        let urls = (0..6)
            .map(|i| format!("https://example.com/{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let (_, issues) = check_content_quality(&urls);
        assert!(issues.contains(&IssueCode::ExcessiveUrls));
    }

    #[test]
    fn test_public_entities() {
        let entities = find_public_entities("O Prefeito visitou a Prefeitura e o STF");
        assert_eq!(entities, vec!["prefeito", "prefeitura", "stf"]);
    }

    #[test]
    fn test_hash_ignores_case_and_spacing() {
        assert_eq!(content_hash("Hello   World "), content_hash("hello world"));
        assert_ne!(content_hash("hello world"), content_hash("hello there"));
    }
}
