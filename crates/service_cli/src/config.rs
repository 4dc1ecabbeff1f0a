//! Configuration resolution.
//!
//! Priority (highest first):
//!
//! 1. Command-line flags
//! 2. `FOLIO_*` environment variables
//! 3. Config file (`--config`, or `folio.toml` in the working directory)
//! 4. Default values

use clap::Args;
use folio_core::EngineConfig;
use std::path::Path;
use tracing::debug;

use crate::{CliError, Result};

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

/// Engine settings that can be overridden on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineOverrides {
    /// Number of simulated paths
    #[arg(long, global = true)]
    pub simulations: Option<usize>,

    /// Projection horizon in years
    #[arg(long, global = true)]
    pub horizon_years: Option<f64>,

    /// Simulation steps per year
    #[arg(long, global = true)]
    pub steps_per_year: Option<u32>,

    /// Random seed for reproducible simulations
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Annualised risk-free rate
    #[arg(long, global = true)]
    pub risk_free_rate: Option<f64>,

    /// Drift from target weights that triggers a rebalance
    #[arg(long, global = true)]
    pub drift_threshold: Option<f64>,

    /// Transaction cost as a fraction of rebalanced portfolio value
    #[arg(long, global = true)]
    pub transaction_cost: Option<f64>,
}

impl EngineOverrides {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(v) = self.simulations {
            config.simulation_count = v;
        }
        if let Some(v) = self.horizon_years {
            config.horizon_years = v;
        }
        if let Some(v) = self.steps_per_year {
            config.periods_per_year = v;
        }
        if let Some(v) = self.seed {
            config.random_seed = Some(v);
        }
        if let Some(v) = self.risk_free_rate {
            config.risk_free_rate = v;
        }
        if let Some(v) = self.drift_threshold {
            config.drift_threshold = v;
        }
        if let Some(v) = self.transaction_cost {
            config.transaction_cost = v;
        }
    }
}

/// Resolves the engine configuration from the process environment.
pub fn resolve(path: Option<&Path>, overrides: &EngineOverrides) -> Result<EngineConfig> {
    resolve_with(path, overrides, |var| std::env::var(var).ok())
}

/// Resolves the engine configuration with an explicit variable lookup.
pub fn resolve_with<F>(
    path: Option<&Path>,
    overrides: &EngineOverrides,
    lookup: F,
) -> Result<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) if !p.exists() => return Err(CliError::FileNotFound(p.display().to_string())),
        Some(p) => {
            debug!("Loading configuration from {}", p.display());
            EngineConfig::from_file(p)?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            debug!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            EngineConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => EngineConfig::default(),
    };
    config.apply_overrides(lookup)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = resolve_with(
            Some(Path::new("/nonexistent/folio.toml")),
            &EngineOverrides::default(),
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_precedence() {
        let path = std::env::temp_dir().join("folio_cli_precedence_test.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "simulation_count = 500\nhorizon_years = 5.0\nrandom_seed = 1").unwrap();

        let overrides = EngineOverrides {
            seed: Some(42),
            ..Default::default()
        };
        let config = resolve_with(Some(&path), &overrides, |var| match var {
            "FOLIO_HORIZON_YEARS" => Some("7.5".to_string()),
            "FOLIO_RANDOM_SEED" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        std::fs::remove_file(&path).ok();

        // file
        assert_eq!(config.simulation_count, 500);
        // env over file
        assert_eq!(config.horizon_years, 7.5);
        // flag over env
        assert_eq!(config.random_seed, Some(42));
        // default
        assert_eq!(config.periods_per_year, 252);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let overrides = EngineOverrides {
            simulations: Some(10),
            ..Default::default()
        };
        let err = resolve_with(None, &overrides, no_env).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
