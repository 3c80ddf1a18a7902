//! Market data provider trait and structured error types.
//!
//! `MarketDataProvider` abstracts over the source of daily closes and option
//! chains (Yahoo Finance, synthetic data) so the backtest and the weekly lock
//! can be driven by a fake in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{OptionChain, PriceBar};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no option chain for {symbol} expiring {expiration}")]
    NoOptionChain {
        symbol: String,
        expiration: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
    Fixture,
}

/// Source of daily closes and option chains for a symbol.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Daily bars for `symbol` with dates in `[start, end]`, ascending.
    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError>;

    /// Listed option expirations for `symbol`.
    fn option_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, DataError>;

    /// Calls and puts for one expiration.
    fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain, DataError>;

    /// False while the provider is refusing requests (rate limit, ban).
    fn is_available(&self) -> bool {
        true
    }
}
