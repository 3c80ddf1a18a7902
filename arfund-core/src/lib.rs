//! AR Fund core: domain types, moving averages, the weekly signal, the
//! Friday-anchored backtest, market data providers, and the weekly lock.
//!
//! - Domain types (bars, option chains, positions, trades, recommendations)
//! - SMA indicators and the three-state classifier
//! - Weekly compounding backtest with per-position leverage
//! - `MarketDataProvider` seam with Yahoo Finance and synthetic sources
//! - Once-per-ISO-week recommendation lock over a pluggable store

pub mod backtest;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod lock;
pub mod params;
pub mod signal;

pub use backtest::{generate_trades, BacktestRun};
pub use params::{ParamsError, StrategyParams};
pub use signal::{classify, SmaTriple};
