//! Folio CLI - Command Line Portfolio Analytics
//!
//! Operational entry point for the portfolio analytics engine. Every command
//! reads a CSV of historical returns (or prices) and writes JSON.
//!
//! # Commands
//!
//! - `folio estimate -r <file>` - Annualised mean returns and covariance
//! - `folio optimise -r <file>` - Mean-variance allocation or efficient frontier
//! - `folio simulate -r <file> -w <weights>` - Monte Carlo value projection
//! - `folio rebalance -r <file> -w <weights>` - Historical rebalancing analysis
//! - `folio risk -r <file> -w <weights>` - Historical risk metrics
//! - `folio check` - Print the resolved configuration
//!
//! # Exit codes
//!
//! `0` on success (including optimiser outcomes reported as `failed`),
//! `2` for invalid arguments or configuration, `3` when the engine rejects
//! the data, `1` for I/O and parse errors.

use clap::{Parser, Subcommand};
use folio_core::Frequency;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod input;
mod output;

pub use error::{CliError, Result};

use commands::optimise::{ObjectiveArg, OptimiseOptions};
use commands::simulate::SimulateOptions;
use config::EngineOverrides;
use input::{parse_frequency, SeriesArgs};
use output::OutputArgs;

/// Portfolio analytics CLI
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults to ./folio.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for parallel work (defaults to the CPU count)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(flatten)]
    overrides: EngineOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate annualised return statistics
    Estimate {
        #[command(flatten)]
        series: SeriesArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Optimise portfolio weights
    Optimise {
        #[command(flatten)]
        series: SeriesArgs,

        /// JSON optimisation request (overrides --objective and friends)
        #[arg(long)]
        request: Option<PathBuf>,

        /// Optimisation objective
        #[arg(long, value_enum, default_value = "max-sharpe")]
        objective: ObjectiveArg,

        /// Target annual return for target-return
        #[arg(long)]
        target: Option<f64>,

        /// Number of frontier points
        #[arg(long)]
        points: Option<usize>,

        /// Upper bound applied to every asset weight
        #[arg(long)]
        max_weight: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Project portfolio value with Monte Carlo simulation
    Simulate {
        #[command(flatten)]
        series: SeriesArgs,

        /// Target weights in column order, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,

        /// Starting portfolio value
        #[arg(long, default_value = "10000")]
        initial_value: f64,

        /// Periodic contribution amount
        #[arg(long)]
        contribution: Option<f64>,

        /// Contribution frequency
        #[arg(long, default_value = "monthly", value_parser = parse_frequency)]
        contribution_frequency: Frequency,

        /// Never rebalance (buy-and-hold)
        #[arg(long)]
        no_rebalance: bool,

        /// Spacing of reported time points
        #[arg(long, default_value = "monthly", value_parser = parse_frequency)]
        record: Frequency,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Analyse drift-triggered rebalancing over history
    Rebalance {
        #[command(flatten)]
        series: SeriesArgs,

        /// Target weights in column order, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,

        /// Starting portfolio value
        #[arg(long, default_value = "10000")]
        initial_value: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compute historical risk metrics
    Risk {
        #[command(flatten)]
        series: SeriesArgs,

        /// Portfolio weights in column order, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check the resolved configuration
    Check,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn init_thread_pool(threads: Option<usize>) {
    let threads = threads.unwrap_or_else(num_cpus::get).max(1);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("Thread pool already initialised: {}", e);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::resolve(cli.config.as_deref(), &cli.overrides)?;

    match cli.command {
        Commands::Estimate { series, output } => commands::estimate::run(&series, &output, &config),
        Commands::Optimise {
            series,
            request,
            objective,
            target,
            points,
            max_weight,
            output,
        } => {
            let options = OptimiseOptions {
                request,
                objective,
                target,
                points,
                max_weight,
            };
            commands::optimise::run(&series, &options, &output, &config)
        }
        Commands::Simulate {
            series,
            weights,
            initial_value,
            contribution,
            contribution_frequency,
            no_rebalance,
            record,
            output,
        } => {
            let options = SimulateOptions {
                weights,
                initial_value,
                contribution,
                contribution_frequency,
                no_rebalance,
                record,
            };
            commands::simulate::run(&series, options, &output, &config)
        }
        Commands::Rebalance {
            series,
            weights,
            initial_value,
            output,
        } => commands::rebalance::run(&series, weights, initial_value, &output, &config),
        Commands::Risk {
            series,
            weights,
            output,
        } => commands::risk::run(&series, &weights, &output, &config),
        Commands::Check => commands::check::run(&config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    init_thread_pool(cli.threads);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
