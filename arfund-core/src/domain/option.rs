//! Option chain snapshot as delivered by a market data provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    Call,
    Put,
}

/// Strike and last traded premium for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub last_price: f64,
}

/// Calls and puts for a single expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiration: NaiveDate,
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn quotes(&self, side: OptionSide) -> &[OptionQuote] {
        match side {
            OptionSide::Call => &self.calls,
            OptionSide::Put => &self.puts,
        }
    }

    /// Call strike closest to `price`. Equal distances resolve to the lower strike.
    pub fn atm_strike(&self, price: f64) -> Option<f64> {
        self.calls
            .iter()
            .map(|q| q.strike)
            .filter(|s| s.is_finite())
            .min_by(|a, b| {
                let da = (a - price).abs();
                let db = (b - price).abs();
                da.total_cmp(&db).then(a.total_cmp(b))
            })
    }

    /// Last traded premium for `strike` on `side`, if the chain lists it.
    pub fn last_price(&self, side: OptionSide, strike: f64) -> Option<f64> {
        self.quotes(side)
            .iter()
            .find(|q| q.strike == strike)
            .map(|q| q.last_price)
            .filter(|p| p.is_finite())
    }
}

/// Expiration closest to `anchor` by whole days. Equal distances resolve to
/// the earlier expiration.
pub fn nearest_expiration(expirations: &[NaiveDate], anchor: NaiveDate) -> Option<NaiveDate> {
    expirations
        .iter()
        .copied()
        .min_by_key(|exp| ((*exp - anchor).num_days().abs(), *exp))
}
