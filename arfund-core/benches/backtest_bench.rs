//! Criterion benchmarks for the dashboard hot paths.
//!
//! Benchmarks:
//! 1. SMA computation (single window, full 5/20/50 set)
//! 2. Weekly backtest over precomputed averages
//! 3. Synthetic provider bar generation

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arfund_core::data::{MarketDataProvider, SyntheticProvider};
use arfund_core::domain::{PriceBar, PriceSeries};
use arfund_core::indicators::{Indicator, MovingAverages, Sma};
use arfund_core::{generate_trades, StrategyParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let mut date = NaiveDate::from_ymd_opt(2019, 1, 7).unwrap();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.02;
        bars.push(PriceBar::new(date, close));
        date += Duration::days(if date.weekday() == Weekday::Fri { 3 } else { 1 });
    }
    PriceSeries::new("BENCH", bars).unwrap()
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);
        let sma_50 = Sma::new(50).unwrap();

        group.bench_with_input(BenchmarkId::new("sma_50", bar_count), &bar_count, |b, _| {
            b.iter(|| sma_50.compute(black_box(series.bars())));
        });

        group.bench_with_input(
            BenchmarkId::new("moving_averages", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| MovingAverages::standard(black_box(series.bars())));
            },
        );
    }

    group.finish();
}

// ── 2. Backtest ──────────────────────────────────────────────────────

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest");
    let params = StrategyParams::default();

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);
        let ma = MovingAverages::standard(series.bars());

        group.bench_with_input(BenchmarkId::new("leveraged", bar_count), &bar_count, |b, _| {
            b.iter(|| generate_trades(black_box(&series), black_box(&ma), true, &params));
        });
    }

    group.finish();
}

// ── 3. Synthetic data ────────────────────────────────────────────────

fn bench_synthetic(c: &mut Criterion) {
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let provider = SyntheticProvider::new(as_of);
    let start = as_of - Duration::days(5 * 366);

    c.bench_function("synthetic_5y_bars", |b| {
        b.iter(|| provider.daily_bars(black_box("SPY"), start, as_of));
    });
}

criterion_group!(benches, bench_indicators, bench_backtest, bench_synthetic);
criterion_main!(benches);
