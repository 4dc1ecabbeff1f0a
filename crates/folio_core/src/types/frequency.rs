//! Calendar frequency enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling or cash-flow frequency.
///
/// Used both to describe how often a return series is observed and how often
/// an external contribution is paid into a simulated portfolio.
///
/// # Examples
///
/// ```
/// use folio_core::types::Frequency;
///
/// let freq = Frequency::Monthly;
/// assert_eq!(freq.periods_per_year(), 12);
/// // A monthly contribution on a daily (252 trading days) grid
/// assert_eq!(freq.interval_in_periods(252), 21);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Once per year.
    Annual,
    /// Twice per year.
    SemiAnnual,
    /// Four times per year.
    Quarterly,
    /// Twelve times per year.
    Monthly,
    /// 52 times per year.
    Weekly,
    /// Every trading day (252 per year).
    Daily,
}

impl Frequency {
    /// Returns the number of periods per year.
    ///
    /// Daily uses the trading-day convention of 252 sessions.
    ///
    /// ```
    /// use folio_core::types::Frequency;
    ///
    /// assert_eq!(Frequency::Annual.periods_per_year(), 1);
    /// assert_eq!(Frequency::Weekly.periods_per_year(), 52);
    /// assert_eq!(Frequency::Daily.periods_per_year(), 252);
    /// ```
    #[inline]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Weekly => 52,
            Frequency::Daily => 252,
        }
    }

    /// Number of simulation steps between two events of this frequency on a
    /// grid with `grid_periods_per_year` steps per year.
    ///
    /// Rounded to the nearest step and never less than one, so a frequency
    /// finer than the grid fires on every step.
    #[inline]
    pub fn interval_in_periods(&self, grid_periods_per_year: u32) -> usize {
        let ratio = grid_periods_per_year as f64 / self.periods_per_year() as f64;
        (ratio.round() as usize).max(1)
    }

    /// Returns the standard name for this frequency.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semi-Annual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
            Frequency::Weekly => "Weekly",
            Frequency::Daily => "Daily",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Frequency {
    type Err = String;

    /// Parses frequency from string (case-insensitive).
    ///
    /// Supported formats:
    /// - Annual: "annual", "1y", "yearly"
    /// - SemiAnnual: "semi-annual", "semiannual", "6m"
    /// - Quarterly: "quarterly", "3m"
    /// - Monthly: "monthly", "1m"
    /// - Weekly: "weekly", "1w"
    /// - Daily: "daily", "1d"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "annual" | "1y" | "yearly" | "12m" => Ok(Frequency::Annual),
            "semiannual" | "6m" => Ok(Frequency::SemiAnnual),
            "quarterly" | "3m" => Ok(Frequency::Quarterly),
            "monthly" | "1m" => Ok(Frequency::Monthly),
            "weekly" | "1w" => Ok(Frequency::Weekly),
            "daily" | "1d" => Ok(Frequency::Daily),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}
