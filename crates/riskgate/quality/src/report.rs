//! Quality report types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Machine-readable issue code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    WrongLanguage,
    InvalidLength,
    TruncatedContent,
    DuplicateContent,
    AllCaps,
    ExcessiveSpecialChars,
    RepetitiveContent,
    ExcessiveUrls,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::WrongLanguage => "WRONG_LANGUAGE",
            IssueCode::InvalidLength => "INVALID_LENGTH",
            IssueCode::TruncatedContent => "TRUNCATED_CONTENT",
            IssueCode::DuplicateContent => "DUPLICATE_CONTENT",
            IssueCode::AllCaps => "ALL_CAPS",
            IssueCode::ExcessiveSpecialChars => "EXCESSIVE_SPECIAL_CHARS",
            IssueCode::RepetitiveContent => "REPETITIVE_CONTENT",
            IssueCode::ExcessiveUrls => "EXCESSIVE_URLS",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub code: IssueCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl QualityIssue {
    pub fn new(code: IssueCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Length measurements of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthInfo {
    pub char_count: usize,
    pub word_count: usize,
    pub min_required: usize,
    pub max_allowed: usize,
}

/// Facts recorded about a sample regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetadata {
    /// blake3 hex digest of the whitespace-normalized, lowercased text.
    pub content_hash: String,
    pub public_entities: Vec<String>,
    pub language_confidence: f64,
    pub length: LengthInfo,
    pub checked_at: DateTime<Utc>,
}

/// Verdict of the quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Overall quality in [0, 1].
    pub score: f64,
    /// Issues in check order.
    pub issues: Vec<QualityIssue>,
    pub usable: bool,
    pub checks_passed: Vec<String>,
    pub checks_failed: Vec<String>,
    pub metadata: QualityMetadata,
}

impl QualityReport {
    /// Issue codes in check order.
    pub fn issue_codes(&self) -> Vec<IssueCode> {
        self.issues.iter().map(|i| i.code).collect()
    }

    pub fn has_issue(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    pub fn has_high_severity(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::High)
    }
}
