//! Trade generator: the weekly Friday-anchored backtest.
//!
//! For every Friday with a fully defined SMA triple:
//! 1. classify the position from that day's averages
//! 2. exit at the close `holding_sessions` bars later, clamped to the last bar
//! 3. compute the position's raw return, optionally scaled by its leverage
//! 4. compound the running capital multiplier
//!
//! Trades near the end of the series hold for fewer sessions because of the
//! clamp; a Friday on the last bar exits at its own close for a zero return.
//!
//! Capital starts at 1.0 and is floored at zero. Once a week's leveraged loss
//! reaches -100% the run is ruined and every later week compounds from zero.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{PriceSeries, Trade};
use crate::indicators::MovingAverages;
use crate::params::StrategyParams;

/// Output of one backtest pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub trades: Vec<Trade>,
    pub final_capital: f64,
    pub leveraged: bool,
    /// True once capital hit zero.
    pub ruined: bool,
}

impl BacktestRun {
    pub fn empty(leveraged: bool) -> Self {
        Self {
            trades: Vec::new(),
            final_capital: 1.0,
            leveraged,
            ruined: false,
        }
    }

    /// Total return over the run as a fraction (final capital minus one).
    pub fn total_return(&self) -> f64 {
        self.final_capital - 1.0
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Share of weeks with a positive return; 0.0 for an empty run.
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        let wins = self.trades.iter().filter(|t| t.is_winner()).count();
        wins as f64 / self.trades.len() as f64
    }

    pub fn best_week(&self) -> Option<&Trade> {
        self.trades
            .iter()
            .max_by(|a, b| a.weekly_return.total_cmp(&b.weekly_return))
    }

    pub fn worst_week(&self) -> Option<&Trade> {
        self.trades
            .iter()
            .min_by(|a, b| a.weekly_return.total_cmp(&b.weekly_return))
    }
}

/// Apply one week's return to the running capital, flooring at zero.
pub fn compound(capital: f64, weekly_return: f64) -> f64 {
    (capital * (1.0 + weekly_return)).max(0.0)
}

/// Run the weekly backtest over `series`.
///
/// `indicators` must be aligned with `series`; indices past its end count as
/// undefined. Fridays lacking a defined triple, or whose entry or exit close
/// is missing, produce no trade.
pub fn generate_trades(
    series: &PriceSeries,
    indicators: &MovingAverages,
    leverage: bool,
    params: &StrategyParams,
) -> BacktestRun {
    let Some(last_index) = series.last_index() else {
        return BacktestRun::empty(leverage);
    };

    let bars = series.bars();
    let mut run = BacktestRun::empty(leverage);
    let mut capital = 1.0_f64;

    for i in series.friday_indices() {
        let Some(triple) = indicators.triple_at(i) else {
            continue;
        };

        let exit_index = (i + params.holding_sessions).min(last_index);
        let (entry, exit) = (&bars[i], &bars[exit_index]);
        if !entry.has_close() || !exit.has_close() {
            debug!(date = %entry.date, "skipping Friday with missing entry or exit close");
            continue;
        }

        let position = triple.classify();
        let mut weekly_return = position.raw_return(entry.close, exit.close);
        if leverage {
            weekly_return *= params.leverage_for(position);
        }

        capital = compound(capital, weekly_return);
        if capital == 0.0 && !run.ruined {
            debug!(date = %entry.date, weekly_return, "capital wiped out");
            run.ruined = true;
        }

        run.trades.push(Trade {
            date: entry.date,
            exit_date: exit.date,
            position,
            entry_price: entry.close,
            exit_price: exit.close,
            weekly_return,
            cumulative: capital,
            month: entry.date.month(),
            iso_week: entry.date.iso_week().week(),
        });
    }

    run.final_capital = capital;
    debug!(
        symbol = series.symbol(),
        trades = run.trades.len(),
        final_capital = capital,
        leverage,
        "backtest complete"
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionSignal, PriceBar};
    use crate::indicators::{assert_approx, make_bars};

    fn run(closes: &[f64], leverage: bool) -> BacktestRun {
        let series = PriceSeries::new("TEST", make_bars(closes)).unwrap();
        let ma = MovingAverages::standard(series.bars());
        generate_trades(&series, &ma, leverage, &StrategyParams::default())
    }

    /// 60 rising closes 41..=100 (index 59 is a Friday) plus a Monday at 99.
    fn bullish_then_dip() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..60).map(|i| 41.0 + i as f64).collect();
        closes.push(99.0);
        closes
    }

    #[test]
    fn bullish_week_clamped_to_series_end() {
        let result = run(&bullish_then_dip(), true);
        // Fridays at 49, 54, 59 have a defined SMA50.
        assert_eq!(result.trades.len(), 3);

        let last = result.trades.last().unwrap();
        assert_eq!(last.position, PositionSignal::BullishCall);
        assert_eq!(last.entry_price, 100.0);
        assert_eq!(last.exit_price, 99.0);
        assert_approx(last.weekly_return, -0.03, 1e-12);

        let prior = result.trades[1].cumulative;
        assert_approx(last.cumulative, prior * 0.97, 1e-12);
        assert_eq!(result.final_capital, last.cumulative);
    }

    #[test]
    fn unleveraged_uses_raw_return() {
        let result = run(&bullish_then_dip(), false);
        assert_approx(result.trades.last().unwrap().weekly_return, -0.01, 1e-12);
    }

    #[test]
    fn friday_on_last_bar_has_zero_return() {
        let closes: Vec<f64> = (0..60).map(|i| 41.0 + i as f64).collect();
        let result = run(&closes, true);
        let last = result.trades.last().unwrap();
        assert_eq!(last.date, last.exit_date);
        assert_eq!(last.weekly_return, 0.0);
        assert_eq!(last.holding_calendar_days(), 0);
    }

    #[test]
    fn full_week_exit_is_five_sessions_later() {
        let result = run(&bullish_then_dip(), true);
        let first = &result.trades[0];
        // Friday 2024-03-08 → Friday 2024-03-15.
        assert_eq!(first.holding_calendar_days(), 7);
        assert_eq!(first.entry_price, 90.0);
        assert_eq!(first.exit_price, 95.0);
        assert_eq!(first.month, 3);
        assert_eq!(first.iso_week, 10);
    }

    #[test]
    fn short_series_has_no_trades() {
        let result = run(&[100.0; 30], true);
        assert!(result.is_empty());
        assert_eq!(result.final_capital, 1.0);
        assert_eq!(result.total_return(), 0.0);
        assert_eq!(result.win_rate(), 0.0);
    }

    #[test]
    fn empty_series() {
        let series = PriceSeries::empty("TEST");
        let result = generate_trades(
            &series,
            &MovingAverages::default(),
            true,
            &StrategyParams::default(),
        );
        assert!(result.is_empty());
        assert!(!result.ruined);
    }

    #[test]
    fn flat_market_is_straddle_with_zero_return() {
        let result = run(&[250.0; 70], true);
        assert!(!result.is_empty());
        assert!(result
            .trades
            .iter()
            .all(|t| t.position == PositionSignal::Straddle && t.weekly_return == 0.0));
        assert_eq!(result.final_capital, 1.0);
    }

    #[test]
    fn falling_market_is_bearish_put() {
        let closes: Vec<f64> = (0..66).map(|i| 200.0 - i as f64).collect();
        let result = run(&closes, true);
        let first = &result.trades[0];
        assert_eq!(first.position, PositionSignal::BearishPut);
        // entry 151, exit 146: 151/146 - 1, times 3
        assert_approx(first.weekly_return, (151.0 / 146.0 - 1.0) * 3.0, 1e-12);
        assert!(first.is_winner());
    }

    #[test]
    fn missing_exit_close_skips_the_week() {
        let mut bars = make_bars(&bullish_then_dip());
        bars[54].close = f64::NAN; // exit for Friday 49, and itself a Friday
        let series = PriceSeries::new("TEST", bars).unwrap();
        let ma = MovingAverages::standard(series.bars());
        let result = generate_trades(&series, &ma, true, &StrategyParams::default());
        // Friday 49 loses its exit, Friday 54 its close, Friday 59 its windows.
        assert!(result.is_empty());
    }

    #[test]
    fn capital_floors_at_zero() {
        // Sharp crash right after a bullish Friday: 3x leverage on -50% wipes out.
        let mut closes: Vec<f64> = (0..50).map(|i| 51.0 + i as f64).collect();
        closes.extend([50.0, 50.0, 50.0, 50.0, 50.0, 50.0]);
        let result = run(&closes, true);
        let first = &result.trades[0];
        assert_eq!(first.position, PositionSignal::BullishCall);
        assert!(first.weekly_return < -1.0);
        assert_eq!(first.cumulative, 0.0);
        assert!(result.ruined);
        assert!(result.trades.iter().all(|t| t.cumulative == 0.0));
        assert_eq!(result.total_return(), -1.0);
    }

    #[test]
    fn compound_floor() {
        assert_eq!(compound(1.0, -1.5), 0.0);
        assert_approx(compound(2.0, 0.1), 2.2, 1e-12);
    }

    #[test]
    fn best_and_worst_week() {
        let result = run(&bullish_then_dip(), true);
        assert_eq!(result.worst_week().unwrap().exit_price, 99.0);
        assert_eq!(result.best_week().unwrap().entry_price, 90.0);
        assert_approx(result.win_rate(), 2.0 / 3.0, 1e-12);
    }

    #[test]
    fn replay_is_bit_identical() {
        let closes: Vec<f64> = (0..300)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        let a = run(&closes, true);
        let b = run(&closes, true);
        assert_eq!(a, b);
        assert_eq!(a.final_capital.to_bits(), b.final_capital.to_bits());
    }

    #[test]
    fn non_friday_bars_never_anchor() {
        let bars: Vec<PriceBar> = make_bars(&bullish_then_dip());
        let series = PriceSeries::new("TEST", bars).unwrap();
        let ma = MovingAverages::standard(series.bars());
        let result = generate_trades(&series, &ma, true, &StrategyParams::default());
        assert!(result
            .trades
            .iter()
            .all(|t| t.date.weekday() == chrono::Weekday::Fri));
    }
}
