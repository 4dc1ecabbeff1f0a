//! Check command implementation
//!
//! Prints the resolved configuration and runtime information.

use folio_core::EngineConfig;
use tracing::info;

use crate::Result;

/// Run the check command
pub fn run(config: &EngineConfig) -> Result<()> {
    info!("folio {}", env!("CARGO_PKG_VERSION"));
    info!("  Worker threads: {}", rayon::current_num_threads());
    info!("  Logical CPUs: {}", num_cpus::get());
    match config.random_seed {
        Some(seed) => info!("  Random seed: {}", seed),
        None => info!("  Random seed: drawn per run"),
    }

    print!("{}", toml::to_string(config)?);
    info!("Configuration is valid");
    Ok(())
}
