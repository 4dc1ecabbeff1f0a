//! CLI error type.

use folio_core::{AnalyticsError, ConfigError, ValidationError};
use thiserror::Error;

/// Errors surfaced by the `folio` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A command-line argument is unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A return file could not be interpreted.
    #[error("{path}: {message}")]
    Input {
        /// File being read
        path: String,
        /// What went wrong
        message: String,
    },

    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The analytics engine rejected the inputs.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML encoding failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Analytics(err.into())
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidArgument(_) | CliError::Config(_) => 2,
            CliError::Analytics(AnalyticsError::Validation(_)) => 2,
            CliError::Analytics(_) => 3,
            _ => 1,
        }
    }
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
