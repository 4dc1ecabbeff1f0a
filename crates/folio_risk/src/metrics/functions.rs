//! Pure risk metric functions.
//!
//! Every function returns `None` when its input has fewer than two
//! observations, so callers never see a metric computed from a degenerate
//! sample.

use folio_core::math::statistics::{percentile_sorted, sorted, ReturnMoments};
use serde::{Deserialize, Serialize};

/// Annualised volatility below which a series is treated as riskless.
pub const ZERO_VOLATILITY: f64 = 1e-12;

/// Value at risk at `confidence` of a sample of period returns (or growth
/// rates relative to the initial value), as a positive loss fraction.
///
/// `VaR_c = −q_{1−c}(r)` with `q` the interpolated percentile.
///
/// # Examples
///
/// ```
/// use folio_risk::metrics::value_at_risk;
///
/// let returns: Vec<f64> = (0..=100).map(|i| (i as f64 - 50.0) / 1000.0).collect();
/// // 5th percentile return is −0.045
/// assert!((value_at_risk(&returns, 0.95).unwrap() - 0.045).abs() < 1e-12);
/// ```
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.len() < 2 || !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    let s = sorted(returns);
    percentile_sorted(&s, (1.0 - confidence) * 100.0).map(|q| -q)
}

/// Conditional value at risk (expected shortfall): mean loss among outcomes
/// at or below the VaR threshold.
///
/// Always at least as large as [`value_at_risk`] at the same confidence.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.len() < 2 || !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    let s = sorted(returns);
    let threshold = percentile_sorted(&s, (1.0 - confidence) * 100.0)?;
    let tail: Vec<f64> = s.iter().copied().take_while(|r| *r <= threshold).collect();
    if tail.is_empty() {
        return Some(-threshold);
    }
    Some(-tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Largest peak-to-trough decline of a value path, as a fraction of the
/// peak. Zero for a path that never declines.
///
/// # Examples
///
/// ```
/// use folio_risk::metrics::max_drawdown;
///
/// let path = [100.0, 120.0, 90.0, 130.0, 117.0];
/// assert!((max_drawdown(&path).unwrap() - 0.25).abs() < 1e-12);
/// ```
pub fn max_drawdown(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.max((peak - v) / peak);
        }
    }
    Some(worst)
}

/// Median and worst of per-path maximum drawdowns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownSummary {
    /// Median maximum drawdown
    pub median: f64,
    /// Largest maximum drawdown
    pub worst: f64,
}

impl DrawdownSummary {
    /// Summary of a single path.
    pub fn single(drawdown: f64) -> Self {
        Self {
            median: drawdown,
            worst: drawdown,
        }
    }
}

/// Summarises per-path maximum drawdowns.
pub fn drawdown_summary(drawdowns: &[f64]) -> Option<DrawdownSummary> {
    if drawdowns.is_empty() {
        return None;
    }
    let s = sorted(drawdowns);
    Some(DrawdownSummary {
        median: percentile_sorted(&s, 50.0)?,
        worst: s[s.len() - 1],
    })
}

/// Annualised volatility of per-period returns.
pub fn annualised_volatility(moments: &ReturnMoments, periods_per_year: u32) -> Option<f64> {
    moments
        .std_dev()
        .map(|sd| sd * (periods_per_year as f64).sqrt())
}

/// Sharpe ratio `(annualised mean − rf) / annualised vol`.
///
/// Exactly `0.0` when the volatility is zero.
pub fn sharpe_ratio(
    moments: &ReturnMoments,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Option<f64> {
    let mean = moments.mean()?;
    let vol = annualised_volatility(moments, periods_per_year)?;
    if vol <= ZERO_VOLATILITY {
        return Some(0.0);
    }
    Some((mean * periods_per_year as f64 - risk_free_rate) / vol)
}

/// Sortino ratio `(annualised mean − rf) / annualised downside deviation`.
///
/// Downside deviation is measured against the per-period risk-free rate
/// (the threshold `moments` was built with). Exactly `0.0` when the
/// volatility or the downside deviation is zero.
pub fn sortino_ratio(
    moments: &ReturnMoments,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Option<f64> {
    let mean = moments.mean()?;
    let vol = annualised_volatility(moments, periods_per_year)?;
    let downside = moments.downside_deviation()? * (periods_per_year as f64).sqrt();
    if vol <= ZERO_VOLATILITY || downside <= ZERO_VOLATILITY {
        return Some(0.0);
    }
    Some((mean * periods_per_year as f64 - risk_free_rate) / downside)
}

/// Compound annual growth rate `(final / initial)^(1 / years) − 1`.
///
/// A non-positive final value yields `−1`.
///
/// # Examples
///
/// ```
/// use folio_risk::metrics::cagr;
///
/// assert!((cagr(100.0, 121.0, 2.0).unwrap() - 0.1).abs() < 1e-12);
/// assert_eq!(cagr(100.0, 121.0, 0.0), None);
/// ```
pub fn cagr(initial: f64, final_value: f64, years: f64) -> Option<f64> {
    if !(initial > 0.0) || !(years > 0.0) || !final_value.is_finite() {
        return None;
    }
    if final_value <= 0.0 {
        return Some(-1.0);
    }
    Some((final_value / initial).powf(1.0 / years) - 1.0)
}
