//! Synthetic market data for offline runs and demos.
//!
//! Closes are a deterministic random walk seeded from the symbol, generated
//! on weekdays from a fixed origin so every requested window sees the same
//! price on the same date. Option chains are priced from intrinsic value plus
//! a flat time premium. Results built on this data are clearly fake.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{OptionChain, OptionQuote, PriceBar};

/// Calendar days of history generated before `as_of`.
const HISTORY_DAYS: i64 = 366 * 8;

const STRIKE_STEP: f64 = 1.0;
const STRIKES_EACH_SIDE: i32 = 10;
const TIME_PREMIUM: f64 = 2.0;
const EXPIRATION_COUNT: i64 = 6;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    as_of: NaiveDate,
}

impl SyntheticProvider {
    /// Data ends at `as_of` (inclusive); expirations are the Fridays after it.
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    fn origin(&self) -> NaiveDate {
        self.as_of - Duration::days(HISTORY_DAYS)
    }

    /// Full walk from the origin to `as_of`.
    fn walk(&self, symbol: &str) -> Vec<PriceBar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = self.origin();

        while current <= self.as_of {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let daily_return: f64 = rng.gen_range(-0.02..0.021);
                price *= 1.0 + daily_return;
                bars.push(PriceBar::new(current, price));
            }
            current += Duration::days(1);
        }

        bars
    }

    fn spot(&self, symbol: &str) -> Option<f64> {
        self.walk(symbol).last().map(|b| b.close)
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        Ok(self
            .walk(symbol)
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect())
    }

    fn option_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
        let days_to_friday =
            (7 + Weekday::Fri.num_days_from_monday() as i64
                - self.as_of.weekday().num_days_from_monday() as i64)
                % 7;
        let first = self.as_of + Duration::days(days_to_friday);
        Ok((0..EXPIRATION_COUNT)
            .map(|w| first + Duration::weeks(w))
            .collect())
    }

    fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain, DataError> {
        let listed = self.option_expirations(symbol)?;
        if !listed.contains(&expiration) {
            return Err(DataError::NoOptionChain {
                symbol: symbol.to_string(),
                expiration,
            });
        }
        let spot = self.spot(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        let center = (spot / STRIKE_STEP).round() * STRIKE_STEP;
        let strikes: Vec<f64> = (-STRIKES_EACH_SIDE..=STRIKES_EACH_SIDE)
            .map(|k| center + k as f64 * STRIKE_STEP)
            .filter(|s| *s > 0.0)
            .collect();

        let price = |intrinsic: f64| ((intrinsic.max(0.0) + TIME_PREMIUM) * 100.0).round() / 100.0;
        Ok(OptionChain {
            expiration,
            calls: strikes
                .iter()
                .map(|&strike| OptionQuote {
                    strike,
                    last_price: price(spot - strike),
                })
                .collect(),
            puts: strikes
                .iter()
                .map(|&strike| OptionQuote {
                    strike,
                    last_price: price(strike - spot),
                })
                .collect(),
        })
    }
}
