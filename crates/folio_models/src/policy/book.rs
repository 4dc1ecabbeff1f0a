//! Per-path portfolio state.

use serde::Serialize;

/// Holdings of one simulated or historical portfolio plus the policy
/// bookkeeping that travels with it.
///
/// Holdings are monetary amounts per asset, in the symbol order of the
/// owning policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioBook {
    holdings: Vec<f64>,
    pub(crate) current_year: usize,
    pub(crate) rebalances_this_year: u32,
    executed: usize,
    suppressed: usize,
    total_cost: f64,
    total_contributed: f64,
}

impl PortfolioBook {
    /// Opens a book with `initial_value` split by `weights`.
    pub fn new(initial_value: f64, weights: &[f64]) -> Self {
        Self {
            holdings: weights.iter().map(|w| w * initial_value).collect(),
            current_year: 0,
            rebalances_this_year: 0,
            executed: 0,
            suppressed: 0,
            total_cost: 0.0,
            total_contributed: 0.0,
        }
    }

    /// Monetary holding per asset.
    #[inline]
    pub fn holdings(&self) -> &[f64] {
        &self.holdings
    }

    /// Total portfolio value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.holdings.iter().sum()
    }

    /// Largest absolute deviation of current weights from `target`.
    ///
    /// Returns zero for a book with no value.
    pub fn max_drift(&self, target: &[f64]) -> f64 {
        let v = self.value();
        if !(v > 0.0) {
            return 0.0;
        }
        self.holdings
            .iter()
            .zip(target)
            .map(|(h, t)| (h / v - t).abs())
            .fold(0.0, f64::max)
    }

    /// Grows holdings by per-asset log-returns.
    #[inline]
    pub fn apply_log_returns(&mut self, log_returns: &[f64]) {
        for (h, r) in self.holdings.iter_mut().zip(log_returns) {
            *h *= r.exp();
        }
    }

    /// Grows holdings by per-asset simple returns.
    #[inline]
    pub fn apply_simple_returns(&mut self, returns: &[f64]) {
        for (h, r) in self.holdings.iter_mut().zip(returns) {
            *h *= 1.0 + r;
        }
    }

    /// Adds `amount` split by `weights`.
    pub fn contribute(&mut self, amount: f64, weights: &[f64]) {
        for (h, w) in self.holdings.iter_mut().zip(weights) {
            *h += amount * w;
        }
        self.total_contributed += amount;
    }

    /// Resets holdings to `weights` and deducts `transaction_cost` times the
    /// rebalanced portfolio value. Returns the cost charged.
    pub fn rebalance_to(&mut self, weights: &[f64], transaction_cost: f64) -> f64 {
        let v = self.value();
        let cost = transaction_cost * v;
        let remaining = v - cost;
        for (h, w) in self.holdings.iter_mut().zip(weights) {
            *h = w * remaining;
        }
        self.total_cost += cost;
        self.executed += 1;
        cost
    }

    pub(crate) fn record_suppressed(&mut self) {
        self.suppressed += 1;
    }

    /// Executed rebalances so far.
    #[inline]
    pub fn executed_rebalances(&self) -> usize {
        self.executed
    }

    /// Threshold breaches that were recorded but not acted upon.
    #[inline]
    pub fn suppressed_breaches(&self) -> usize {
        self.suppressed
    }

    /// Cumulative transaction cost.
    #[inline]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Cumulative external contributions.
    #[inline]
    pub fn total_contributed(&self) -> f64 {
        self.total_contributed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_and_value() {
        let book = PortfolioBook::new(1000.0, &[0.6, 0.4]);
        assert_eq!(book.holdings(), &[600.0, 400.0]);
        assert_eq!(book.value(), 1000.0);
        assert_eq!(book.max_drift(&[0.6, 0.4]), 0.0);
    }

    #[test]
    fn test_drift_after_growth() {
        let mut book = PortfolioBook::new(1000.0, &[0.5, 0.5]);
        book.apply_simple_returns(&[1.0, 0.0]);
        // Holdings 1000 / 500: weights 2/3, 1/3
        assert_relative_eq!(book.max_drift(&[0.5, 0.5]), 1.0 / 6.0, epsilon = 1e-15);
    }

    #[test]
    fn test_log_returns() {
        let mut book = PortfolioBook::new(100.0, &[1.0]);
        book.apply_log_returns(&[0.1_f64.ln_1p()]);
        assert_relative_eq!(book.value(), 110.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rebalance_cost() {
        let mut book = PortfolioBook::new(1000.0, &[0.5, 0.5]);
        book.apply_simple_returns(&[1.0, 0.0]);
        let cost = book.rebalance_to(&[0.5, 0.5], 0.01);
        // 1% of the 1500 being rebalanced, whatever the traded amount
        assert_relative_eq!(cost, 15.0, epsilon = 1e-12);
        assert_relative_eq!(book.value(), 1485.0, epsilon = 1e-12);
        assert_relative_eq!(book.holdings()[0], 742.5, epsilon = 1e-12);
        assert_eq!(book.executed_rebalances(), 1);
        assert_relative_eq!(book.total_cost(), 15.0, epsilon = 1e-12);
        assert!(book.max_drift(&[0.5, 0.5]) < 1e-15);
    }

    #[test]
    fn test_contribute() {
        let mut book = PortfolioBook::new(0.0, &[0.25, 0.75]);
        assert_eq!(book.max_drift(&[0.25, 0.75]), 0.0);
        book.contribute(100.0, &[0.25, 0.75]);
        assert_eq!(book.holdings(), &[25.0, 75.0]);
        assert_eq!(book.total_contributed(), 100.0);
    }
}
