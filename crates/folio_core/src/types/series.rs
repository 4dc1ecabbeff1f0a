//! Time-indexed per-asset return series.
//!
//! [`ReturnSeries`] is the single input format consumed by the estimator,
//! the risk calculator and the rebalancing analyzer. It is validated once at
//! construction and immutable afterwards.

use super::error::ValidationError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Ordered simple returns for a set of assets over a common time index.
///
/// Returns are stored per asset (`returns[i][t]` is the return of asset `i`
/// over period `t`). All assets share the same number of observations and
/// the index contains no gaps.
///
/// # Invariants
///
/// - at least one symbol, no duplicates
/// - one return vector per symbol, all of equal length
/// - every return finite and strictly greater than -1
/// - `periods_per_year > 0`
/// - dates, when present, one per observation and strictly increasing
///
/// # Examples
///
/// ```
/// use folio_core::types::ReturnSeries;
///
/// let series = ReturnSeries::from_prices(
///     vec!["AAA".to_string()],
///     vec![vec![100.0, 110.0, 99.0]],
///     12,
/// )
/// .unwrap();
/// assert_eq!(series.len(), 2);
/// assert!((series.asset(0)[0] - 0.10).abs() < 1e-12);
/// assert!((series.asset(0)[1] + 0.10).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    symbols: Vec<String>,
    returns: Vec<Vec<f64>>,
    periods_per_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    dates: Option<Vec<NaiveDate>>,
}

impl ReturnSeries {
    /// Creates a validated return series.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when any of the type invariants is
    /// violated.
    pub fn new(
        symbols: Vec<String>,
        returns: Vec<Vec<f64>>,
        periods_per_year: u32,
    ) -> Result<Self, ValidationError> {
        validate_symbols(&symbols)?;
        if returns.len() != symbols.len() {
            return Err(ValidationError::length_mismatch(
                "returns",
                symbols.len(),
                returns.len(),
            ));
        }
        if periods_per_year == 0 {
            return Err(ValidationError::out_of_range(
                "periods_per_year",
                "must be positive",
            ));
        }

        let n_obs = returns[0].len();
        for (symbol, asset) in symbols.iter().zip(&returns) {
            if asset.len() != n_obs {
                return Err(ValidationError::InvalidSeries(format!(
                    "{} has {} observations, expected {}",
                    symbol,
                    asset.len(),
                    n_obs
                )));
            }
            if let Some((t, r)) = asset
                .iter()
                .enumerate()
                .find(|(_, r)| !r.is_finite() || **r <= -1.0)
            {
                return Err(ValidationError::InvalidSeries(format!(
                    "{} has invalid return {} at index {}",
                    symbol, r, t
                )));
            }
        }

        Ok(Self {
            symbols,
            returns,
            periods_per_year,
            dates: None,
        })
    }

    /// Builds a return series from per-asset price histories.
    ///
    /// Each price vector must hold at least two strictly positive, finite
    /// prices. The resulting series has one observation fewer than the
    /// price history.
    pub fn from_prices(
        symbols: Vec<String>,
        prices: Vec<Vec<f64>>,
        periods_per_year: u32,
    ) -> Result<Self, ValidationError> {
        validate_symbols(&symbols)?;
        if prices.len() != symbols.len() {
            return Err(ValidationError::length_mismatch(
                "prices",
                symbols.len(),
                prices.len(),
            ));
        }

        let mut returns = Vec::with_capacity(prices.len());
        for (symbol, history) in symbols.iter().zip(&prices) {
            if history.len() < 2 {
                return Err(ValidationError::InvalidSeries(format!(
                    "{} needs at least two prices, got {}",
                    symbol,
                    history.len()
                )));
            }
            if let Some(p) = history.iter().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(ValidationError::InvalidSeries(format!(
                    "{} has non-positive price {}",
                    symbol, p
                )));
            }
            returns.push(history.windows(2).map(|w| w[1] / w[0] - 1.0).collect());
        }

        Self::new(symbols, returns, periods_per_year)
    }

    /// Attaches one date per observation.
    ///
    /// # Errors
    ///
    /// Fails when the number of dates differs from [`len`](Self::len) or the
    /// dates are not strictly increasing.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, ValidationError> {
        if dates.len() != self.len() {
            return Err(ValidationError::length_mismatch(
                "dates",
                self.len(),
                dates.len(),
            ));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ValidationError::InvalidSeries(format!(
                "dates must be strictly increasing, found {} after {}",
                w[1], w[0]
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Asset symbols in column order.
    #[inline]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of assets.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Number of observations per asset.
    #[inline]
    pub fn len(&self) -> usize {
        self.returns.first().map_or(0, Vec::len)
    }

    /// Returns `true` when the series holds no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observation frequency used for annualisation.
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Returns of asset `i`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_assets()`.
    #[inline]
    pub fn asset(&self, i: usize) -> &[f64] {
        &self.returns[i]
    }

    /// All per-asset return vectors.
    #[inline]
    pub fn assets(&self) -> &[Vec<f64>] {
        &self.returns
    }

    /// Writes the cross-section of returns at period `t` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()` or `out.len() != n_assets()`.
    #[inline]
    pub fn observation_into(&self, t: usize, out: &mut [f64]) {
        for (o, asset) in out.iter_mut().zip(&self.returns) {
            *o = asset[t];
        }
    }

    /// Observation dates, if attached.
    #[inline]
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Date of observation `t`, if dates are attached.
    #[inline]
    pub fn date(&self, t: usize) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.get(t).copied())
    }

    /// Position of `symbol` in the column order.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Sub-series covering observations `start..end`.
    ///
    /// # Errors
    ///
    /// Fails on an empty or out-of-bounds range.
    pub fn window(&self, start: usize, end: usize) -> Result<Self, ValidationError> {
        if start >= end || end > self.len() {
            return Err(ValidationError::InvalidSeries(format!(
                "window {}..{} out of bounds for {} observations",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            symbols: self.symbols.clone(),
            returns: self
                .returns
                .iter()
                .map(|a| a[start..end].to_vec())
                .collect(),
            periods_per_year: self.periods_per_year,
            dates: self.dates.as_ref().map(|d| d[start..end].to_vec()),
        })
    }
}

fn validate_symbols(symbols: &[String]) -> Result<(), ValidationError> {
    if symbols.is_empty() {
        return Err(ValidationError::EmptySymbols);
    }
    let mut seen = HashSet::with_capacity(symbols.len());
    for s in symbols {
        if s.trim().is_empty() {
            return Err(ValidationError::InvalidSeries(
                "symbol must not be blank".to_string(),
            ));
        }
        if !seen.insert(s.as_str()) {
            return Err(ValidationError::DuplicateSymbol(s.clone()));
        }
    }
    Ok(())
}
