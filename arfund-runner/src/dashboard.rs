//! Dashboard runner: wires data loading, both backtests, and the weekly lock.
//!
//! Two entry points:
//! - `build_dashboard()`: the full report for one day. Used by the CLI's
//!   `dashboard` command.
//! - `run_window_backtest()`: a single backtest over an explicit window.
//!   Used by the CLI's `backtest` command.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use arfund_core::data::{DataSource, MarketDataProvider};
use arfund_core::indicators::MovingAverages;
use arfund_core::lock::{LockStore, WeeklyLock, WeeklyOutcome};
use arfund_core::{generate_trades, BacktestRun, StrategyParams};

use crate::calendar::MonthlyCalendar;
use crate::config::{ConfigError, DashboardConfig};
use crate::data_loader::{compute_dataset_hash, load_window, LoadedSeries, Window};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One backtest and the window it ran over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBacktest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bar_count: usize,
    pub source: DataSource,
    pub run: BacktestRun,
}

impl WindowBacktest {
    pub fn total_return(&self) -> f64 {
        self.run.total_return()
    }
}

/// Everything the dashboard shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub as_of: NaiveDate,
    /// Leveraged, over the configured trailing years.
    pub backtest_5y: WindowBacktest,
    /// Unleveraged, January 1st to yesterday.
    pub backtest_ytd: WindowBacktest,
    pub total_return_5y: f64,
    pub total_return_ytd: f64,
    pub current_week: WeeklyOutcome,
    pub calendar: MonthlyCalendar,
    pub data_quality_warnings: Vec<String>,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

fn backtest_loaded(
    loaded: &LoadedSeries,
    window: Window,
    leverage: bool,
    params: &StrategyParams,
) -> (WindowBacktest, MovingAverages) {
    let indicators = MovingAverages::compute(loaded.series.bars(), params);
    let run = generate_trades(&loaded.series, &indicators, leverage, params);
    let backtest = WindowBacktest {
        start: window.start,
        end: window.end,
        bar_count: loaded.series.len(),
        source: loaded.source,
        run,
    };
    (backtest, indicators)
}

/// Build the dashboard for `today`.
///
/// Data problems never fail the build: they surface as empty backtests,
/// `data_quality_warnings`, and a `NoRecommendation` outcome.
pub fn build_dashboard(
    config: &DashboardConfig,
    provider: &dyn MarketDataProvider,
    store: &dyn LockStore,
    today: NaiveDate,
) -> Result<DashboardReport, RunError> {
    config.validate()?;
    let symbol = config.symbol();
    let params = &config.strategy;

    let long_window = Window::trailing_years(today, config.dashboard.history_years);
    let ytd_window = Window::year_to_date(today);

    let long = load_window(provider, symbol, long_window, "5y");
    let ytd = load_window(provider, symbol, ytd_window, "ytd");

    let (backtest_5y, _) = backtest_loaded(&long, long_window, true, params);
    let (backtest_ytd, ytd_indicators) = backtest_loaded(&ytd, ytd_window, false, params);

    let current_week = WeeklyLock::new(store, provider)
        .with_params(config.recommendation.clone())
        .current_week(today, &ytd.series, &ytd_indicators);

    let calendar = MonthlyCalendar::build(&backtest_ytd.run.trades, today);
    let dataset_hash = compute_dataset_hash(&[&long.series, &ytd.series]);
    let has_synthetic = [long.source, ytd.source].contains(&DataSource::Synthetic);

    let mut data_quality_warnings = long.warnings;
    data_quality_warnings.extend(ytd.warnings);
    if !ytd.series.is_empty() && ytd.series.len() <= params.warmup_bars() {
        data_quality_warnings.push(format!(
            "ytd: {} sessions, the first signal needs more than {}",
            ytd.series.len(),
            params.warmup_bars()
        ));
    }

    info!(
        symbol,
        %today,
        total_return_5y = backtest_5y.total_return(),
        total_return_ytd = backtest_ytd.total_return(),
        "dashboard built"
    );

    Ok(DashboardReport {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        as_of: today,
        total_return_5y: backtest_5y.total_return(),
        total_return_ytd: backtest_ytd.total_return(),
        backtest_5y,
        backtest_ytd,
        current_week,
        calendar,
        data_quality_warnings,
        dataset_hash,
        has_synthetic,
    })
}

/// Backtest `symbol` over `[start, end]` with the given parameters.
pub fn run_window_backtest(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    leverage: bool,
    params: &StrategyParams,
) -> Result<(WindowBacktest, Vec<String>), RunError> {
    if start > end {
        return Err(RunError::InvalidRange { start, end });
    }
    params
        .validate()
        .map_err(|e| RunError::Config(ConfigError::Strategy(e)))?;

    let window = Window { start, end };
    let loaded = load_window(provider, symbol, window, "backtest");
    let (backtest, _) = backtest_loaded(&loaded, window, leverage, params);
    Ok((backtest, loaded.warnings))
}
