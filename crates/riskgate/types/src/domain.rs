//! Risk domains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain a sample is evaluated under.
///
/// Unknown hints never fail a request: [`Domain::from_hint`] falls back to
/// [`Domain::General`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Political actors, campaigns, and institutions.
    Political,
    /// Attacks on the reputation of a person.
    Defamation,
    /// False or manipulative claims.
    Misinformation,
    /// Content posing as an authority or institution.
    Impersonation,
    /// Corruption and general legal risk.
    General,
}

/// Error returned by strict domain parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown domain: {0}")]
pub struct UnknownDomain(pub String);

impl Domain {
    /// Every domain, in table order.
    pub const ALL: [Domain; 5] = [
        Domain::Political,
        Domain::Defamation,
        Domain::Misinformation,
        Domain::Impersonation,
        Domain::General,
    ];

    /// Resolve an optional free-form hint, falling back to `General`.
    pub fn from_hint(hint: Option<&str>) -> Self {
        hint.and_then(|h| h.parse().ok()).unwrap_or(Domain::General)
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Political => "political",
            Domain::Defamation => "defamation",
            Domain::Misinformation => "misinformation",
            Domain::Impersonation => "impersonation",
            Domain::General => "general",
        }
    }
}

impl Default for Domain {
    fn default() -> Self {
        Domain::General
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "political" => Ok(Domain::Political),
            "defamation" => Ok(Domain::Defamation),
            "misinformation" => Ok(Domain::Misinformation),
            "impersonation" => Ok(Domain::Impersonation),
            "general" => Ok(Domain::General),
            other => Err(UnknownDomain(other.to_string())),
        }
    }
}
