//! Configuration for riskgate-service

use std::time::Duration;

use riskgate_calibration::{CalibrationMethod, CalibrationParams, ModelKind};
use riskgate_decision::ThresholdConfig;
use riskgate_feedback::FeedbackConfig;
use riskgate_quality::QualityConfig;
use riskgate_resilience::{CircuitBreakerConfig, ExecutorConfig};
use riskgate_uncertainty::UncertaintyConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskGateConfig {
    /// Inference deadlines and input limits
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Circuit breaker settings
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Data-quality gate settings
    #[serde(default)]
    pub quality: QualityConfig,

    /// Calibration settings
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Uncertainty and abstention settings
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,

    /// Decision thresholds
    #[serde(default)]
    pub decision: ThresholdConfig,

    /// Feedback queue and history
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Version reported in every assessment
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl Default for RiskGateConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            resilience: ResilienceConfig::default(),
            quality: QualityConfig::default(),
            calibration: CalibrationConfig::default(),
            uncertainty: UncertaintyConfig::default(),
            decision: ThresholdConfig::default(),
            feedback: FeedbackConfig::default(),
            logging: LoggingConfig::default(),
            model_version: default_model_version(),
        }
    }
}

/// Inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Deadline for each bounded stage, in seconds
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout: f64,

    /// Inputs longer than this are truncated before quality checks
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            inference_timeout: default_inference_timeout(),
            max_text_length: default_max_text_length(),
        }
    }
}

impl InferenceConfig {
    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig::from_secs_f64(self.inference_timeout)
    }
}

/// Resilience configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive failures before the breaker opens
    #[serde(default = "default_breaker_threshold")]
    pub circuit_breaker_threshold: u32,

    /// Seconds the breaker stays open before allowing a retry
    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: default_breaker_threshold(),
            circuit_breaker_reset: default_breaker_reset(),
        }
    }
}

impl ResilienceConfig {
    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker_threshold,
            reset_timeout: Duration::from_secs(self.circuit_breaker_reset),
        }
    }
}

/// Calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Method applied on the request path
    #[serde(default)]
    pub method: CalibrationMethod,

    #[serde(default = "default_platt_a")]
    pub platt_a: f64,

    #[serde(default = "default_platt_b")]
    pub platt_b: f64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            method: CalibrationMethod::default(),
            platt_a: default_platt_a(),
            platt_b: default_platt_b(),
            temperature: default_temperature(),
        }
    }
}

impl CalibrationConfig {
    pub fn params(&self) -> CalibrationParams {
        CalibrationParams {
            platt_a: self.platt_a,
            platt_b: self.platt_b,
            temperature: self.temperature,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_inference_timeout() -> f64 {
    5.0
}

fn default_max_text_length() -> usize {
    5000
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_reset() -> u64 {
    60
}

fn default_platt_a() -> f64 {
    CalibrationParams::for_model(ModelKind::RiskClassifier).platt_a
}

fn default_platt_b() -> f64 {
    CalibrationParams::for_model(ModelKind::RiskClassifier).platt_b
}

fn default_temperature() -> f64 {
    CalibrationParams::for_model(ModelKind::RiskClassifier).temperature
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_version() -> String {
    "1.0.0".to_string()
}

impl RiskGateConfig {
    /// Load configuration from file
    ///
    /// Environment overrides use `__` between section and key, e.g.
    /// `RISKGATE_INFERENCE__INFERENCE_TIMEOUT=2.5`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&RiskGateConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with RISKGATE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("RISKGATE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.inference.inference_timeout > 0.0) {
            return Err(PipelineError::Config(format!(
                "inference_timeout must be positive, got {}",
                self.inference.inference_timeout
            )));
        }
        if self.inference.max_text_length == 0 {
            return Err(PipelineError::Config(
                "max_text_length must be at least 1".to_string(),
            ));
        }
        if self.resilience.circuit_breaker_threshold == 0 {
            return Err(PipelineError::Config(
                "circuit_breaker_threshold must be at least 1".to_string(),
            ));
        }
        if !(self.calibration.temperature > 0.0) {
            return Err(PipelineError::Config(format!(
                "temperature must be positive, got {}",
                self.calibration.temperature
            )));
        }
        self.decision
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RiskGateConfig::default();
        assert_eq!(config.inference.inference_timeout, 5.0);
        assert_eq!(config.inference.max_text_length, 5000);
        assert_eq!(config.resilience.circuit_breaker_threshold, 5);
        assert_eq!(config.resilience.circuit_breaker_reset, 60);
        assert_eq!(config.calibration.method, CalibrationMethod::Platt);
        assert_eq!(config.model_version, "1.0.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resilience_conversion() {
        let breaker = ResilienceConfig::default().breaker();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.reset_timeout, Duration::from_secs(60));

        let executor = InferenceConfig::default().executor();
        assert_eq!(executor.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RiskGateConfig::default();
        config.inference.inference_timeout = 0.0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = RiskGateConfig::default();
        config.resilience.circuit_breaker_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = RiskGateConfig::default();
        config.decision.low_risk_max = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RiskGateConfig =
            serde_json::from_str(r#"{"inference": {"inference_timeout": 2.5}}"#).unwrap();
        assert_eq!(config.inference.inference_timeout, 2.5);
        assert_eq!(config.inference.max_text_length, 5000);
        assert_eq!(config.decision, ThresholdConfig::default());
    }

    #[test]
    fn test_load_without_file() {
        let config = RiskGateConfig::load(None).unwrap();
        assert_eq!(config.resilience.circuit_breaker_threshold, 5);
        assert_eq!(config.logging.level, "info");
    }
}
