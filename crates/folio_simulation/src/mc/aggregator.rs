//! Cross-sectional percentile aggregation of simulated values.

use folio_core::math::statistics::{mean, percentile_sorted, std_dev};
use serde::{Deserialize, Serialize};

/// Percentiles reported for every recorded time point.
pub const PERCENTILES: [f64; 7] = [5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

/// Percentiles of the simulated portfolio value at one time point.
///
/// Non-decreasing from `p5` to `p95` by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    /// 5th percentile
    pub p5: f64,
    /// 10th percentile
    pub p10: f64,
    /// 25th percentile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
}

impl PercentileBand {
    /// Band of an ascending slice; `None` when empty.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let mut v = [0.0; 7];
        for (out, p) in v.iter_mut().zip(PERCENTILES) {
            *out = percentile_sorted(sorted, p)?;
        }
        Some(Self::from_array(v))
    }

    /// Band from values ordered as [`PERCENTILES`].
    pub fn from_array(v: [f64; 7]) -> Self {
        Self {
            p5: v[0],
            p10: v[1],
            p25: v[2],
            p50: v[3],
            p75: v[4],
            p90: v[5],
            p95: v[6],
        }
    }

    /// Values ordered as [`PERCENTILES`].
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.p5, self.p10, self.p25, self.p50, self.p75, self.p90, self.p95,
        ]
    }

    /// Value of one of the reported percentiles.
    pub fn get(&self, percentile: f64) -> Option<f64> {
        PERCENTILES
            .iter()
            .position(|p| *p == percentile)
            .map(|i| self.as_array()[i])
    }

    /// Returns `true` when the percentiles are non-decreasing.
    pub fn is_monotone(&self) -> bool {
        self.as_array().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Distribution of simulated terminal values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalSummary {
    /// Percentiles of the terminal value
    pub percentiles: PercentileBand,
    /// Mean terminal value
    pub mean: f64,
    /// Sample standard deviation of the terminal value
    pub std_dev: f64,
    /// Smallest terminal value
    pub min: f64,
    /// Largest terminal value
    pub max: f64,
}

/// Collects per-path values at recorded time points and reduces each
/// cross-section to a [`PercentileBand`].
///
/// Percentiles interpolate linearly between adjacent order statistics of
/// the cross-section.
///
/// # Examples
///
/// ```
/// use folio_simulation::mc::PercentileAggregator;
///
/// let mut agg = PercentileAggregator::new(2);
/// for v in 1..=101 {
///     agg.push_path(&[100.0, v as f64]);
/// }
/// let bands = agg.bands();
/// assert_eq!(bands[0].p50, 100.0);
/// assert_eq!(bands[1].p5, 6.0);
/// assert_eq!(bands[1].p95, 96.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PercentileAggregator {
    columns: Vec<Vec<f64>>,
}

impl PercentileAggregator {
    /// Aggregator for paths with `n_points` recorded values each.
    pub fn new(n_points: usize) -> Self {
        Self {
            columns: vec![Vec::new(); n_points],
        }
    }

    /// Aggregator with room for `n_paths` paths.
    pub fn with_capacity(n_points: usize, n_paths: usize) -> Self {
        Self {
            columns: (0..n_points).map(|_| Vec::with_capacity(n_paths)).collect(),
        }
    }

    /// Number of recorded time points.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.columns.len()
    }

    /// Number of paths pushed so far.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Adds one path's recorded values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != n_points()`.
    pub fn push_path(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.columns.len(), "recorded point count");
        for (col, v) in self.columns.iter_mut().zip(values) {
            col.push(*v);
        }
    }

    /// Percentile band per time point, in time order.
    ///
    /// Returns an empty vector before any path has been pushed.
    pub fn bands(&self) -> Vec<PercentileBand> {
        let mut scratch = Vec::with_capacity(self.n_paths());
        self.columns
            .iter()
            .filter_map(|col| {
                scratch.clear();
                scratch.extend_from_slice(col);
                scratch.sort_by(|a, b| a.total_cmp(b));
                PercentileBand::from_sorted(&scratch)
            })
            .collect()
    }

    /// Summary of the last recorded time point.
    pub fn terminal(&self) -> Option<TerminalSummary> {
        self.columns.last().and_then(|col| summarise(col))
    }
}

/// Percentiles, mean, standard deviation and range of `values`.
///
/// `None` for an empty slice; the standard deviation of a single value is 0.
pub fn summarise(values: &[f64]) -> Option<TerminalSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(TerminalSummary {
        percentiles: PercentileBand::from_sorted(&sorted)?,
        mean: mean(values)?,
        std_dev: std_dev(values).unwrap_or(0.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}
