//! Indicator trait and the moving-average set the signal is read from.
//!
//! Indicators are pure functions: bar history in, series of the same length
//! out. A value that cannot be computed yet (warmup, or a missing close
//! inside the window) is `None`, never a sentinel number.

pub mod sma;

pub use sma::Sma;

use crate::domain::PriceBar;
use crate::params::StrategyParams;
use crate::signal::SmaTriple;

/// Trait for indicators.
///
/// No value at bar t may depend on data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of bars before the indicator produces a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>>;
}

/// Fast, mid, and slow SMAs aligned index-for-index with a price series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovingAverages {
    fast: Vec<Option<f64>>,
    mid: Vec<Option<f64>>,
    slow: Vec<Option<f64>>,
}

impl MovingAverages {
    /// Compute the three SMAs for the windows in `params`.
    ///
    /// Windows are expected to be validated; a zero window yields an
    /// all-undefined series.
    pub fn compute(bars: &[PriceBar], params: &StrategyParams) -> Self {
        let series = |period: usize| match Sma::new(period) {
            Some(sma) => sma.compute(bars),
            None => vec![None; bars.len()],
        };
        Self {
            fast: series(params.fast_window),
            mid: series(params.mid_window),
            slow: series(params.slow_window),
        }
    }

    /// SMA5 / SMA20 / SMA50.
    pub fn standard(bars: &[PriceBar]) -> Self {
        Self::compute(bars, &StrategyParams::default())
    }

    /// Assemble from precomputed series. All three must have the same length.
    pub fn from_parts(
        fast: Vec<Option<f64>>,
        mid: Vec<Option<f64>>,
        slow: Vec<Option<f64>>,
    ) -> Option<Self> {
        (fast.len() == mid.len() && mid.len() == slow.len()).then_some(Self { fast, mid, slow })
    }

    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    pub fn fast(&self) -> &[Option<f64>] {
        &self.fast
    }

    pub fn mid(&self) -> &[Option<f64>] {
        &self.mid
    }

    pub fn slow(&self) -> &[Option<f64>] {
        &self.slow
    }

    /// All three values at `index`, or `None` if any is undefined.
    pub fn triple_at(&self, index: usize) -> Option<SmaTriple> {
        Some(SmaTriple {
            fast: (*self.fast.get(index)?)?,
            mid: (*self.mid.get(index)?)?,
            slow: (*self.slow.get(index)?)?,
        })
    }

    /// Index with a fully defined triple closest in calendar days to `target`.
    ///
    /// Equal distances resolve to the earlier date.
    pub fn nearest_defined(&self, bars: &[PriceBar], target: chrono::NaiveDate) -> Option<usize> {
        bars.iter()
            .enumerate()
            .filter(|(i, bar)| bar.has_close() && self.triple_at(*i).is_some())
            .min_by_key(|(_, bar)| ((bar.date - target).num_days().abs(), bar.date))
            .map(|(i, _)| i)
    }
}

/// Create bars from close prices on consecutive weekdays starting Monday
/// 2024-01-01, so index 4, 9, 14, ... are Fridays.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let mut date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut bars = Vec::with_capacity(closes.len());
    for &close in closes {
        bars.push(PriceBar::new(date, close));
        date = next_weekday(date);
    }
    bars
}

#[cfg(test)]
fn next_weekday(date: chrono::NaiveDate) -> chrono::NaiveDate {
    use chrono::{Datelike, Weekday};
    let step = match date.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    date + chrono::Duration::days(step)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
