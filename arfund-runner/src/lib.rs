//! AR Fund Runner: dashboard orchestration, configuration, exports.
//!
//! This crate builds on `arfund-core` to provide:
//! - TOML dashboard configuration with validated defaults
//! - Loading of the trailing and year-to-date price windows
//! - Both backtests plus the weekly lock, gathered into one report
//! - Monthly calendar of year-to-date trades
//! - JSON / CSV / Markdown artifact export

pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod data_loader;
pub mod export;

pub use calendar::{CalendarMonth, CalendarRow, MonthlyCalendar};
pub use config::{ConfigError, DashboardConfig, DashboardSection};
pub use dashboard::{
    build_dashboard, run_window_backtest, DashboardReport, RunError, WindowBacktest,
    SCHEMA_VERSION,
};
pub use data_loader::{compute_dataset_hash, load_window, LoadedSeries, Window};
