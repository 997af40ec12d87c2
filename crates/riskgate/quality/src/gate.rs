//! The data-quality gate.

use chrono::Utc;
use tracing::{debug, instrument, Span};

use riskgate_types::stats::round4;

use crate::checks;
use crate::config::QualityConfig;
use crate::dedup::DedupCache;
use crate::report::{IssueCode, LengthInfo, QualityIssue, QualityMetadata, QualityReport, Severity};

const LANGUAGE_PENALTY: f64 = 0.3;
const LENGTH_PENALTY: f64 = 0.25;
const TRUNCATION_PENALTY: f64 = 0.15;
const DUPLICATE_PENALTY: f64 = 0.1;

/// Pre-inference validation of raw text.
///
/// The only shared state is the duplicate-content set, which carries its own
/// lock; everything else is computed per call.
#[derive(Debug)]
pub struct DataQualityGate {
    config: QualityConfig,
    dedup: DedupCache,
}

impl DataQualityGate {
    pub fn new(config: QualityConfig) -> Self {
        let dedup = DedupCache::new(config.dedup_capacity);
        Self { config, dedup }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Number of hashes currently remembered for duplicate detection.
    pub fn remembered(&self) -> usize {
        self.dedup.len()
    }

    /// Run every check and build the report.
    #[instrument(skip(self, text), fields(chars = tracing::field::Empty))]
    pub fn validate(&self, text: &str) -> QualityReport {
        let mut issues = Vec::new();
        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut score: f64 = 1.0;

        let (language_ok, language_confidence) = checks::check_language(text);
        if language_ok {
            passed.push("language_check".to_string());
        } else {
            issues.push(
                QualityIssue::new(
                    IssueCode::WrongLanguage,
                    Severity::High,
                    "Text does not appear to be Portuguese or English",
                )
                .with_detail("confidence", language_confidence),
            );
            failed.push("language_check".to_string());
            score -= LANGUAGE_PENALTY;
        }

        let (char_count, word_count) = checks::measure_length(text);
        Span::current().record("chars", char_count as u64);
        let length = LengthInfo {
            char_count,
            word_count,
            min_required: self.config.min_text_length,
            max_allowed: self.config.max_text_length,
        };
        if char_count >= length.min_required && char_count <= length.max_allowed {
            passed.push("length_check".to_string());
        } else {
            let severity = if char_count < length.min_required {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(
                QualityIssue::new(
                    IssueCode::InvalidLength,
                    severity,
                    format!("Text length {} outside valid range", char_count),
                )
                .with_detail("char_count", char_count)
                .with_detail("word_count", word_count)
                .with_detail("min_required", length.min_required)
                .with_detail("max_allowed", length.max_allowed),
            );
            failed.push("length_check".to_string());
            score -= LENGTH_PENALTY;
        }

        match checks::check_truncation(text) {
            Some(pattern) => {
                issues.push(
                    QualityIssue::new(
                        IssueCode::TruncatedContent,
                        Severity::Medium,
                        "Text appears to be truncated",
                    )
                    .with_detail("pattern", pattern),
                );
                failed.push("truncation_check".to_string());
                score -= TRUNCATION_PENALTY;
            }
            None => passed.push("truncation_check".to_string()),
        }

        let content_hash = checks::content_hash(text);
        if self.dedup.check_and_insert(&content_hash) {
            issues.push(
                QualityIssue::new(
                    IssueCode::DuplicateContent,
                    Severity::Low,
                    "Duplicate content detected",
                )
                .with_detail("hash", content_hash.clone()),
            );
            failed.push("duplicate_check".to_string());
            score -= DUPLICATE_PENALTY;
        } else {
            passed.push("duplicate_check".to_string());
        }

        let public_entities = checks::find_public_entities(text);
        passed.push("entity_check".to_string());

        let (content_score, content_issues) = checks::check_content_quality(text);
        for code in content_issues {
            issues.push(QualityIssue::new(
                code,
                Severity::Low,
                format!("Content quality issue: {}", code),
            ));
            failed.push(format!("content_{}", code.as_str().to_lowercase()));
        }

        let score = round4((score * content_score).clamp(0.0, 1.0));
        let high_severity = issues.iter().any(|i| i.severity == Severity::High);
        let mut usable = score >= self.config.min_quality_score && !high_severity;
        if self.config.strict_mode && !issues.is_empty() {
            usable = false;
        }

        debug!(
            score,
            usable,
            issues = issues.len(),
            "Quality gate evaluated sample"
        );

        QualityReport {
            score,
            issues,
            usable,
            checks_passed: passed,
            checks_failed: failed,
            metadata: QualityMetadata {
                content_hash,
                public_entities,
                language_confidence,
                length,
                checked_at: Utc::now(),
            },
        }
    }
}

impl Default for DataQualityGate {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = "The committee approved the budget for the new school building.";

    #[test]
    fn test_clean_text_is_usable() {
        let gate = DataQualityGate::default();
        let report = gate.validate(CLEAN);
        assert!(report.usable);
        assert!(report.issues.is_empty());
        assert_eq!(report.score, 1.0);
        assert!(report.checks_passed.contains(&"entity_check".to_string()));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let text = "A comissão já aprovou o orçamento da nova escola pública.";
        let report = DataQualityGate::default().validate(text);
        assert_eq!(report.metadata.length.char_count, text.chars().count());
        assert!(report.metadata.length.char_count < text.len());
    }

    #[test]
    fn test_short_text_is_rejected_with_high_severity() {
        let gate = DataQualityGate::default();
        let report = gate.validate("hello");
        assert!(!report.usable);

        let issue = report
            .issues
            .iter()
            .find(|i| i.code == IssueCode::InvalidLength)
            .unwrap();
        assert_eq!(issue.severity, Severity::High);
    }

    #[test]
    fn test_duplicate_flagged_on_second_submission_only() {
        let gate = DataQualityGate::default();
        let first = gate.validate(CLEAN);
        assert!(!first.has_issue(IssueCode::DuplicateContent));

        let second = gate.validate("the committee   approved the budget for the new school building.");
        assert!(second.has_issue(IssueCode::DuplicateContent));
        assert!(second.usable);
        assert!((second.score - 0.9).abs() < 1e-9);
        assert_eq!(first.metadata.content_hash, second.metadata.content_hash);
    }

    #[test]
    fn test_truncated_text_usable_unless_strict() {
        let text = "The committee approved the budget for the new school building and the plan for \
                    the library that will open next year with support from the city";

        let report = DataQualityGate::default().validate(text);
        assert!(report.has_issue(IssueCode::TruncatedContent));
        assert!(report.usable);
        assert!((report.score - 0.85).abs() < 1e-9);

        let strict = DataQualityGate::new(QualityConfig::strict()).validate(text);
        assert!(!strict.usable);
    }

    #[test]
    fn test_score_multiplies_content_sub_score() {
        let gate = DataQualityGate::default();
        let report = gate.validate("THE COMMITTEE APPROVED THE BUDGET FOR THE NEW SCHOOL BUILDING.");
        assert!(report.has_issue(IssueCode::AllCaps));
        assert!((report.score - 0.9).abs() < 1e-9);
        assert!(report.checks_failed.contains(&"content_all_caps".to_string()));
    }

    #[test]
    fn test_symbol_noise_is_unusable() {
        let gate = DataQualityGate::default();
        let noise: String = "#$%&*@!?~^".chars().cycle().take(5000).collect();
        let report = gate.validate(&noise);
        assert!(!report.usable);
        assert!(report.has_issue(IssueCode::WrongLanguage));
        assert!(report.has_issue(IssueCode::ExcessiveSpecialChars));
    }
}
