//! Market data: provider seam, Yahoo Finance client, synthetic fallback

pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataSource, MarketDataProvider};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
