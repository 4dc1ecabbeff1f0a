//! Engine configuration management.
//!
//! Handles loading the analytics configuration from TOML and `FOLIO_*`
//! environment variables. Priority when both are used (highest first):
//!
//! 1. Environment variables
//! 2. Config file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is outside its admissible range.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Configuration key
        key: &'static str,
        /// Description of the admissible range
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// An environment variable could not be parsed.
    #[error("Environment variable {var} has invalid value '{value}'")]
    EnvError {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

/// Analytics engine configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
///
/// # Examples
///
/// ```
/// use folio_core::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("simulation_count = 500\nrandom_seed = 7").unwrap();
/// assert_eq!(config.simulation_count, 500);
/// assert_eq!(config.random_seed, Some(7));
/// assert_eq!(config.periods_per_year, 252);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Number of simulated paths
    pub simulation_count: usize,
    /// Projection horizon in years
    pub horizon_years: f64,
    /// Simulation steps (and observation periods) per year
    pub periods_per_year: u32,
    /// Absolute weight drift that triggers a rebalance
    pub drift_threshold: f64,
    /// Cost charged per rebalance as a fraction of portfolio value
    pub transaction_cost: f64,
    /// Rebalance cap per calendar year of simulation
    pub max_rebalances_per_year: u32,
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Seed for reproducible simulations
    pub random_seed: Option<u64>,
    /// Minimum historical observations for estimation
    pub min_observations: usize,
    /// Covariance condition number above which diagonal loading is applied
    pub max_condition_number: f64,
    /// Confidence level for VaR and CVaR
    pub var_confidence: f64,
    /// Number of target returns on the efficient frontier
    pub frontier_points: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_count: 1000,
            horizon_years: 10.0,
            periods_per_year: 252,
            drift_threshold: 0.05,
            transaction_cost: 0.001,
            max_rebalances_per_year: 4,
            risk_free_rate: 0.0,
            random_seed: None,
            min_observations: 20,
            max_condition_number: 1e8,
            var_confidence: 0.95,
            frontier_points: 20,
        }
    }
}

/// Environment variables recognised by [`EngineConfig::apply_env`].
pub const ENV_VARS: [&str; 12] = [
    "FOLIO_SIMULATION_COUNT",
    "FOLIO_HORIZON_YEARS",
    "FOLIO_PERIODS_PER_YEAR",
    "FOLIO_DRIFT_THRESHOLD",
    "FOLIO_TRANSACTION_COST",
    "FOLIO_MAX_REBALANCES_PER_YEAR",
    "FOLIO_RISK_FREE_RATE",
    "FOLIO_RANDOM_SEED",
    "FOLIO_MIN_OBSERVATIONS",
    "FOLIO_MAX_CONDITION_NUMBER",
    "FOLIO_VAR_CONFIDENCE",
    "FOLIO_FRONTIER_POINTS",
];

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvError { var, value })
}

impl EngineConfig {
    /// Create a new EngineConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from defaults overridden by environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the `FOLIO_*` process environment, then validate.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Override fields from an arbitrary variable lookup, then validate.
    ///
    /// `lookup` receives names from [`ENV_VARS`]. An empty
    /// `FOLIO_RANDOM_SEED` clears the seed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        macro_rules! set {
            ($var:literal, $field:ident) => {
                if let Some(value) = lookup($var) {
                    self.$field = parse_var($var, value)?;
                }
            };
        }

        set!("FOLIO_SIMULATION_COUNT", simulation_count);
        set!("FOLIO_HORIZON_YEARS", horizon_years);
        set!("FOLIO_PERIODS_PER_YEAR", periods_per_year);
        set!("FOLIO_DRIFT_THRESHOLD", drift_threshold);
        set!("FOLIO_TRANSACTION_COST", transaction_cost);
        set!("FOLIO_MAX_REBALANCES_PER_YEAR", max_rebalances_per_year);
        set!("FOLIO_RISK_FREE_RATE", risk_free_rate);
        set!("FOLIO_MIN_OBSERVATIONS", min_observations);
        set!("FOLIO_MAX_CONDITION_NUMBER", max_condition_number);
        set!("FOLIO_VAR_CONFIDENCE", var_confidence);
        set!("FOLIO_FRONTIER_POINTS", frontier_points);

        if let Some(value) = lookup("FOLIO_RANDOM_SEED") {
            self.random_seed = if value.trim().is_empty() {
                None
            } else {
                Some(parse_var("FOLIO_RANDOM_SEED", value)?)
            };
        }

        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_count < 100 {
            return Err(ConfigError::invalid(
                "simulation_count",
                format!("must be at least 100, got {}", self.simulation_count),
            ));
        }
        if !(self.horizon_years >= 1.0) || !self.horizon_years.is_finite() {
            return Err(ConfigError::invalid(
                "horizon_years",
                format!("must be at least 1, got {}", self.horizon_years),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(ConfigError::invalid("periods_per_year", "must be positive"));
        }
        if !(self.drift_threshold > 0.0 && self.drift_threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "drift_threshold",
                format!("must be in (0, 1], got {}", self.drift_threshold),
            ));
        }
        if !(self.transaction_cost >= 0.0 && self.transaction_cost < 1.0) {
            return Err(ConfigError::invalid(
                "transaction_cost",
                format!("must be in [0, 1), got {}", self.transaction_cost),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::invalid("risk_free_rate", "must be finite"));
        }
        if self.min_observations < 2 {
            return Err(ConfigError::invalid(
                "min_observations",
                format!("must be at least 2, got {}", self.min_observations),
            ));
        }
        if !(self.max_condition_number > 1.0) || !self.max_condition_number.is_finite() {
            return Err(ConfigError::invalid(
                "max_condition_number",
                format!("must be finite and > 1, got {}", self.max_condition_number),
            ));
        }
        if !(self.var_confidence > 0.0 && self.var_confidence < 1.0) {
            return Err(ConfigError::invalid(
                "var_confidence",
                format!("must be in (0, 1), got {}", self.var_confidence),
            ));
        }
        if self.frontier_points < 2 {
            return Err(ConfigError::invalid(
                "frontier_points",
                format!("must be at least 2, got {}", self.frontier_points),
            ));
        }
        Ok(())
    }

    /// Number of simulation steps implied by the horizon.
    #[inline]
    pub fn total_steps(&self) -> usize {
        (self.horizon_years * self.periods_per_year as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.simulation_count, 1000);
        assert_eq!(config.horizon_years, 10.0);
        assert_eq!(config.periods_per_year, 252);
        assert_eq!(config.drift_threshold, 0.05);
        assert_eq!(config.transaction_cost, 0.001);
        assert_eq!(config.max_rebalances_per_year, 4);
        assert_eq!(config.risk_free_rate, 0.0);
        assert_eq!(config.random_seed, None);
        assert_eq!(config.min_observations, 20);
        assert_eq!(config.max_condition_number, 1e8);
        assert_eq!(config.var_confidence, 0.95);
        assert_eq!(config.frontier_points, 20);
        assert!(config.validate().is_ok());
        assert_eq!(config.total_steps(), 2520);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str(
            r#"
            horizon_years = 5.0
            drift_threshold = 0.1
            random_seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.horizon_years, 5.0);
        assert_eq!(config.drift_threshold, 0.1);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.simulation_count, 1000);
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        let err = EngineConfig::from_toml_str("simulations = 10").unwrap_err();
        assert!(matches!(err, ConfigError::FileError(_)));
    }

    #[test]
    fn test_from_toml_validates() {
        let err = EngineConfig::from_toml_str("simulation_count = 10").unwrap_err();
        assert!(err.to_string().contains("simulation_count"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("FOLIO_SIMULATION_COUNT", "2000"),
                ("FOLIO_RANDOM_SEED", "99"),
                ("FOLIO_RISK_FREE_RATE", " 0.02 "),
            ]))
            .unwrap();
        assert_eq!(config.simulation_count, 2000);
        assert_eq!(config.random_seed, Some(99));
        assert_eq!(config.risk_free_rate, 0.02);
    }

    #[test]
    fn test_env_empty_seed_clears() {
        let mut config = EngineConfig {
            random_seed: Some(1),
            ..Default::default()
        };
        config
            .apply_overrides(lookup_from(&[("FOLIO_RANDOM_SEED", "")]))
            .unwrap();
        assert_eq!(config.random_seed, None);
    }

    #[test]
    fn test_env_parse_error() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("FOLIO_HORIZON_YEARS", "ten")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvError {
                var: "FOLIO_HORIZON_YEARS",
                ..
            }
        ));
    }

    #[test]
    fn test_validation_ranges() {
        let base = EngineConfig::default();
        let cases = [
            EngineConfig {
                horizon_years: 0.5,
                ..base.clone()
            },
            EngineConfig {
                drift_threshold: 0.0,
                ..base.clone()
            },
            EngineConfig {
                drift_threshold: 1.5,
                ..base.clone()
            },
            EngineConfig {
                transaction_cost: 1.0,
                ..base.clone()
            },
            EngineConfig {
                var_confidence: 1.0,
                ..base.clone()
            },
            EngineConfig {
                max_condition_number: f64::NAN,
                ..base.clone()
            },
            EngineConfig {
                frontier_points: 1,
                ..base.clone()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?}", config);
        }

        let edge = EngineConfig {
            drift_threshold: 1.0,
            transaction_cost: 0.0,
            ..base
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        let err = EngineConfig::from_file(Path::new("/nonexistent/folio.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileError(_)));
    }
}
