//! Feedback records and their classification.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use riskgate_types::{Domain, RiskLevel, UnknownLabel, Verdict};

/// A label as seen by a reviewer: either a risk level or a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Risk(RiskLevel),
    Verdict(Verdict),
}

impl Label {
    /// Labels whose correction means the prediction was a false alarm.
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            Label::Risk(RiskLevel::NoRisk | RiskLevel::LowRisk) | Label::Verdict(Verdict::Real)
        )
    }

    /// Labels whose correction means a risk was missed.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Label::Risk(RiskLevel::HighRisk) | Label::Verdict(Verdict::Fake))
    }

    /// Ground truth used to score individual model signals.
    pub fn is_risky(&self) -> bool {
        matches!(
            self,
            Label::Risk(RiskLevel::HighRisk | RiskLevel::MediumRisk) | Label::Verdict(Verdict::Fake)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Risk(level) => level.as_str(),
            Label::Verdict(verdict) => verdict.as_str(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<RiskLevel>()
            .map(Label::Risk)
            .or_else(|_| s.parse::<Verdict>().map(Label::Verdict))
    }
}

impl From<RiskLevel> for Label {
    fn from(level: RiskLevel) -> Self {
        Label::Risk(level)
    }
}

impl From<Verdict> for Label {
    fn from(verdict: Verdict) -> Self {
        Label::Verdict(verdict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Correct,
    FalsePositive,
    FalseNegative,
    Override,
}

impl FeedbackType {
    pub fn classify(original: Label, corrected: Label) -> Self {
        if original == corrected {
            FeedbackType::Correct
        } else if corrected.is_safe() {
            FeedbackType::FalsePositive
        } else if corrected.is_high_risk() {
            FeedbackType::FalseNegative
        } else {
            FeedbackType::Override
        }
    }
}

/// A human correction as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub scan_id: String,
    pub original_prediction: Label,
    pub original_score: f64,
    pub corrected_label: Label,
    #[serde(default = "default_agent")]
    pub agent_id: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub model_signals: BTreeMap<String, f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_agent() -> String {
    "human".to_string()
}

impl FeedbackSubmission {
    pub fn new(
        scan_id: impl Into<String>,
        original_prediction: impl Into<Label>,
        original_score: f64,
        corrected_label: impl Into<Label>,
    ) -> Self {
        Self {
            scan_id: scan_id.into(),
            original_prediction: original_prediction.into(),
            original_score,
            corrected_label: corrected_label.into(),
            agent_id: default_agent(),
            domain: Domain::General,
            model_signals: BTreeMap::new(),
            notes: None,
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_signals(mut self, model_signals: BTreeMap<String, f64>) -> Self {
        self.model_signals = model_signals;
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A classified correction kept in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub scan_id: String,
    pub original_prediction: Label,
    pub original_score: f64,
    pub feedback_type: FeedbackType,
    pub corrected_label: Label,
    pub agent_id: String,
    pub domain: Domain,
    pub model_signals: BTreeMap<String, f64>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn from_submission(submission: FeedbackSubmission) -> Self {
        let feedback_type =
            FeedbackType::classify(submission.original_prediction, submission.corrected_label);
        Self {
            scan_id: submission.scan_id,
            original_prediction: submission.original_prediction,
            original_score: submission.original_score,
            feedback_type,
            corrected_label: submission.corrected_label,
            agent_id: submission.agent_id,
            domain: submission.domain,
            model_signals: submission.model_signals,
            notes: submission.notes,
            timestamp: Utc::now(),
        }
    }
}
