//! Look-ahead contamination tests.
//!
//! No SMA value and no signal at bar t may depend on price data from bar t+1
//! or later. Method: compute on a truncated series and on the full series and
//! assert the shared prefix is identical.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use arfund_core::domain::{PriceBar, PriceSeries};
use arfund_core::indicators::{Indicator, MovingAverages, Sma};
use arfund_core::{generate_trades, StrategyParams};

/// N weekday bars of a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<PriceBar> {
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);
        bars.push(PriceBar::new(date, price));
        date += Duration::days(if date.weekday() == Weekday::Fri { 3 } else { 1 });
    }

    bars
}

#[test]
fn sma_has_no_lookahead() {
    let full = make_test_bars(200);
    for period in [5, 20, 50] {
        let sma = Sma::new(period).unwrap();
        let whole = sma.compute(&full);
        let prefix = sma.compute(&full[..100]);
        assert_eq!(prefix.len(), 100);
        for (t, (a, b)) in prefix.iter().zip(&whole).enumerate() {
            assert_eq!(
                a.map(f64::to_bits),
                b.map(f64::to_bits),
                "{}: value at bar {t} changed when future bars were added",
                sma.name()
            );
        }
    }
}

#[test]
fn signals_have_no_lookahead() {
    let full = make_test_bars(200);
    let whole = MovingAverages::standard(&full);
    let prefix = MovingAverages::standard(&full[..120]);
    for t in 0..120 {
        assert_eq!(
            prefix.triple_at(t).map(|x| x.classify()),
            whole.triple_at(t).map(|x| x.classify()),
            "signal at bar {t} changed when future bars were added"
        );
    }
}

#[test]
fn completed_weeks_do_not_change_when_history_grows() {
    let bars = make_test_bars(200);
    let params = StrategyParams::default();
    let full = PriceSeries::new("TEST", bars.clone()).unwrap();
    let short = PriceSeries::new("TEST", bars[..150].to_vec()).unwrap();

    let a = generate_trades(&full, &MovingAverages::standard(full.bars()), true, &params);
    let b = generate_trades(&short, &MovingAverages::standard(short.bars()), true, &params);

    // Weeks whose exit lies inside the short series are final.
    let last_short = short.last_date().unwrap();
    let complete: Vec<_> = b.trades.iter().filter(|t| t.exit_date < last_short).collect();
    assert!(!complete.is_empty());
    for (x, y) in complete.iter().zip(&a.trades) {
        assert_eq!(**x, *y);
    }
}
