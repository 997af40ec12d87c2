//! Risk levels, verdicts, and abstention reasons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Banded risk level of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    NoRisk,
    LowRisk,
    MediumRisk,
    HighRisk,
    /// Deferred to a human reviewer.
    HumanReview,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::NoRisk => "NO_RISK",
            RiskLevel::LowRisk => "LOW_RISK",
            RiskLevel::MediumRisk => "MEDIUM_RISK",
            RiskLevel::HighRisk => "HIGH_RISK",
            RiskLevel::HumanReview => "HUMAN_REVIEW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label string is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO_RISK" => Ok(RiskLevel::NoRisk),
            "LOW_RISK" => Ok(RiskLevel::LowRisk),
            "MEDIUM_RISK" => Ok(RiskLevel::MediumRisk),
            "HIGH_RISK" => Ok(RiskLevel::HighRisk),
            "HUMAN_REVIEW" => Ok(RiskLevel::HumanReview),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Consumer-facing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Real,
    Unverified,
    Fake,
    Abstain,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Unverified => "UNVERIFIED",
            Verdict::Fake => "FAKE",
            Verdict::Abstain => "ABSTAIN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REAL" => Ok(Verdict::Real),
            "UNVERIFIED" => Ok(Verdict::Unverified),
            "FAKE" => Ok(Verdict::Fake),
            "ABSTAIN" => Ok(Verdict::Abstain),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Condition that caused a stage to abstain, with the offending value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbstainReason {
    /// Combined (or domain-weighted) uncertainty above the threshold.
    HighUncertainty { value: f64, threshold: f64 },
    /// Model confidence below the minimum.
    LowConfidence { value: f64, threshold: f64 },
    /// Inter-model agreement below the minimum.
    LowAgreement { value: f64, threshold: f64 },
    /// Extra-caution domain with uncertainty above its stricter bound.
    DomainCaution {
        domain: crate::Domain,
        uncertainty: f64,
        threshold: f64,
    },
}

impl fmt::Display for AbstainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstainReason::HighUncertainty { value, threshold } => {
                write!(f, "high uncertainty ({:.2} > {:.2})", value, threshold)
            }
            AbstainReason::LowConfidence { value, threshold } => {
                write!(f, "low confidence ({:.2} < {:.2})", value, threshold)
            }
            AbstainReason::LowAgreement { value, threshold } => {
                write!(f, "low model agreement ({:.2} < {:.2})", value, threshold)
            }
            AbstainReason::DomainCaution {
                domain,
                uncertainty,
                threshold,
            } => write!(
                f,
                "domain caution for {} (uncertainty {:.2} > {:.2})",
                domain, uncertainty, threshold
            ),
        }
    }
}
