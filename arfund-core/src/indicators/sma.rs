//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first defined value at index period-1).

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Returns `None` for a zero period.
    pub fn new(period: usize) -> Option<Self> {
        (period >= 1).then(|| Self {
            period,
            name: format!("sma_{period}"),
        })
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut result = vec![None; bars.len()];
        if bars.len() < self.period {
            return result;
        }

        // Each window is summed from scratch: no drift carried between windows.
        for (i, window) in bars.windows(self.period).enumerate() {
            if window.iter().all(PriceBar::has_close) {
                let sum: f64 = window.iter().map(|b| b.close).sum();
                result[i + self.period - 1] = Some(sum / self.period as f64);
            }
        }

        result
    }
}
