//! JSON output.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::Result;

/// Where results are written.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

impl OutputArgs {
    /// Serialises `value` to the configured destination.
    pub fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        match &self.output {
            Some(path) => {
                std::fs::write(path, json + "\n")?;
                info!("Wrote {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
