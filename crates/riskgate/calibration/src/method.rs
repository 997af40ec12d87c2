//! Calibration method and model-kind selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    #[default]
    Platt,
    Isotonic,
    Temperature,
}

impl CalibrationMethod {
    pub const ALL: [CalibrationMethod; 3] = [
        CalibrationMethod::Platt,
        CalibrationMethod::Isotonic,
        CalibrationMethod::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationMethod::Platt => "platt",
            CalibrationMethod::Isotonic => "isotonic",
            CalibrationMethod::Temperature => "temperature",
        }
    }
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown calibration method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for CalibrationMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "platt" => Ok(CalibrationMethod::Platt),
            "isotonic" => Ok(CalibrationMethod::Isotonic),
            "temperature" => Ok(CalibrationMethod::Temperature),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Kind of model whose output is being calibrated; selects default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RiskClassifier,
    DefamationDetector,
    Ner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_round_trip() {
        for method in CalibrationMethod::ALL {
            assert_eq!(method.as_str().parse::<CalibrationMethod>().unwrap(), method);
        }
        assert!("beta".parse::<CalibrationMethod>().is_err());
        assert_eq!("PLATT".parse::<CalibrationMethod>().unwrap(), CalibrationMethod::Platt);
    }
}
