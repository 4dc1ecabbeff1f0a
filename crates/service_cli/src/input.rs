//! Historical return input.
//!
//! CSV layout: a header row of symbols, optionally preceded by a `date`
//! column (`YYYY-MM-DD`), then one row per period. Values are simple
//! returns, or prices when `--prices` is given.
//!
//! ```text
//! date,EQ,BD
//! 2024-01-31,0.012,-0.003
//! 2024-02-29,-0.020,0.004
//! ```

use chrono::NaiveDate;
use clap::Args;
use folio_core::{Frequency, ReturnSeries};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{CliError, Result};

/// Where the historical series comes from.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// CSV file of per-period returns (or prices with --prices)
    #[arg(short, long)]
    pub returns: PathBuf,

    /// Observation frequency of the file
    #[arg(short, long, default_value = "daily", value_parser = parse_frequency)]
    pub frequency: Frequency,

    /// Treat the values as prices and convert them to returns
    #[arg(long)]
    pub prices: bool,
}

pub(crate) fn parse_frequency(s: &str) -> std::result::Result<Frequency, String> {
    s.parse()
}

impl SeriesArgs {
    /// Reads and validates the series.
    pub fn load(&self) -> Result<ReturnSeries> {
        let path = &self.returns;
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        let series = read_series(file, path, self.frequency, self.prices)?;
        info!(
            "Loaded {} observations of {} assets from {}",
            series.len(),
            series.n_assets(),
            path.display()
        );
        Ok(series)
    }
}

/// Parses a return (or price) table from any reader.
pub fn read_series<R: Read>(
    reader: R,
    path: &Path,
    frequency: Frequency,
    prices: bool,
) -> Result<ReturnSeries> {
    let input_error = |message: String| CliError::Input {
        path: path.display().to_string(),
        message,
    };

    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv.headers()?.clone();
    let has_dates = headers
        .get(0)
        .is_some_and(|h| h.eq_ignore_ascii_case("date"));
    let offset = usize::from(has_dates);
    let symbols: Vec<String> = headers.iter().skip(offset).map(str::to_string).collect();
    if symbols.is_empty() {
        return Err(input_error("no asset columns".into()));
    }

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); symbols.len()];
    for (row, record) in csv.records().enumerate() {
        let record = record?;
        let line = row + 2;
        if has_dates {
            let raw = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| input_error(format!("line {}: bad date '{}': {}", line, raw, e)))?;
            dates.push(date);
        }
        for (j, column) in columns.iter_mut().enumerate() {
            let raw = record.get(j + offset).unwrap_or_default();
            let value: f64 = raw.parse().map_err(|_| {
                input_error(format!(
                    "line {}: bad value '{}' for {}",
                    line, raw, symbols[j]
                ))
            })?;
            column.push(value);
        }
    }

    let ppy = frequency.periods_per_year();
    let series = if prices {
        if has_dates && !dates.is_empty() {
            dates.remove(0);
        }
        ReturnSeries::from_prices(symbols, columns, ppy)?
    } else {
        ReturnSeries::new(symbols, columns, ppy)?
    };
    if has_dates {
        Ok(series.with_dates(dates)?)
    } else {
        Ok(series)
    }
}
