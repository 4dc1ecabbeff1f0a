//! Optimise command implementation
//!
//! Mean-variance allocation from estimated statistics. Solver failures are
//! printed as a `failed` outcome rather than treated as CLI errors.

use clap::ValueEnum;
use folio_core::EngineConfig;
use folio_optimiser::{AssetBounds, Objective, OptimizationOutcome, OptimizationRequest, PortfolioOptimizer};
use std::path::Path;
use tracing::{info, warn};

use super::estimate_statistics;
use crate::input::SeriesArgs;
use crate::output::OutputArgs;
use crate::{CliError, Result};

/// Objective selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ObjectiveArg {
    /// Maximum Sharpe ratio
    MaxSharpe,
    /// Minimum volatility
    MinVolatility,
    /// Minimum volatility at a target return
    TargetReturn,
    /// Efficient frontier
    Frontier,
}

/// Request built from flags when no request file is given.
#[derive(Debug, Clone)]
pub struct OptimiseOptions {
    /// JSON request file; overrides the flags below
    pub request: Option<std::path::PathBuf>,
    /// Objective
    pub objective: ObjectiveArg,
    /// Target return for `target-return`
    pub target: Option<f64>,
    /// Frontier points for `frontier`
    pub points: Option<usize>,
    /// Uniform cap on every asset weight
    pub max_weight: Option<f64>,
}

fn objective_from(options: &OptimiseOptions) -> Result<Objective> {
    Ok(match options.objective {
        ObjectiveArg::MaxSharpe => Objective::MaxSharpe,
        ObjectiveArg::MinVolatility => Objective::MinVolatility,
        ObjectiveArg::TargetReturn => Objective::TargetReturn {
            target: options.target.ok_or_else(|| {
                CliError::InvalidArgument("--target is required for target-return".into())
            })?,
        },
        ObjectiveArg::Frontier => Objective::EfficientFrontier {
            points: options.points,
        },
    })
}

fn load_request(path: &Path) -> Result<OptimizationRequest> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Builds the request from a file or from the flags.
pub fn build_request(
    options: &OptimiseOptions,
    symbols: &[String],
    config: &EngineConfig,
) -> Result<OptimizationRequest> {
    if let Some(path) = &options.request {
        return load_request(path);
    }
    let mut request = OptimizationRequest::new(symbols.to_vec(), objective_from(options)?)
        .with_risk_free_rate(config.risk_free_rate);
    if let Some(cap) = options.max_weight {
        request = request.with_bounds(vec![AssetBounds::new(0.0, cap); symbols.len()]);
    }
    Ok(request)
}

/// Run the optimise command
pub fn run(
    series: &SeriesArgs,
    options: &OptimiseOptions,
    output: &OutputArgs,
    config: &EngineConfig,
) -> Result<()> {
    let history = series.load()?;
    let stats = estimate_statistics(&history, config)?;
    let request = build_request(options, stats.symbols(), config)?;

    let outcome = PortfolioOptimizer::from_config(config).optimise(&request, &stats)?;
    match &outcome {
        OptimizationOutcome::Solved(result) => info!(
            "Solved {}: return {:.4}, volatility {:.4}, Sharpe {:.3}",
            result.objective, result.expected_return, result.volatility, result.sharpe_ratio
        ),
        OptimizationOutcome::Failed(failure) => warn!("{}", failure),
    }
    output.emit(&outcome)
}
