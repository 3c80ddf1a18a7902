//! Weekly lock: one recommendation per ISO week.
//!
//! The first request in a week reads the signal from the latest Friday in
//! the year-to-date series, prices it off the live option chain, and writes
//! the result to the store. Every later request in the same week returns the
//! stored value without touching the provider.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::record::LockRecord;
use super::store::{LockError, LockStore};
use crate::data::MarketDataProvider;
use crate::domain::{
    nearest_expiration, CurrentWeekRecommendation, PriceSeries, STOP_LOSS_MULTIPLIER,
    TAKE_PROFIT_MULTIPLIER,
};
use crate::indicators::MovingAverages;

/// Premium multipliers for the exit levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockParams {
    pub take_profit_multiplier: f64,
    pub stop_loss_multiplier: f64,
}

impl Default for LockParams {
    fn default() -> Self {
        Self {
            take_profit_multiplier: TAKE_PROFIT_MULTIPLIER,
            stop_loss_multiplier: STOP_LOSS_MULTIPLIER,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("{name} must be a positive finite number (got {value})")]
pub struct LockParamsError {
    pub name: &'static str,
    pub value: f64,
}

impl LockParams {
    pub fn validate(&self) -> Result<(), LockParamsError> {
        for (name, value) in [
            ("take_profit_multiplier", self.take_profit_multiplier),
            ("stop_loss_multiplier", self.stop_loss_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LockParamsError { name, value });
            }
        }
        Ok(())
    }
}

/// Why no recommendation could be produced this week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoRecommendation {
    /// The year-to-date series contains no Friday session.
    NoFridays,
    /// No session in the series has all three averages defined.
    InsufficientHistory,
    /// The provider listed no option expirations, or listing them failed.
    NoExpirations,
}

impl NoRecommendation {
    pub fn describe(&self) -> &'static str {
        match self {
            NoRecommendation::NoFridays => "no Friday sessions in the year-to-date data",
            NoRecommendation::InsufficientHistory => "not enough history for the moving averages",
            NoRecommendation::NoExpirations => "no option expirations available",
        }
    }
}

/// How a returned recommendation was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockSource {
    /// Read back from the store for the current week.
    Cached,
    /// Computed now and written to the store.
    Computed,
    /// Computed now but left unlocked because the store rejected the
    /// write. The next request recomputes.
    Provisional,
}

/// Result of asking for the current week's recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeeklyOutcome {
    Locked {
        recommendation: CurrentWeekRecommendation,
        source: LockSource,
    },
    NoRecommendation(NoRecommendation),
}

impl WeeklyOutcome {
    pub fn recommendation(&self) -> Option<&CurrentWeekRecommendation> {
        match self {
            WeeklyOutcome::Locked { recommendation, .. } => Some(recommendation),
            WeeklyOutcome::NoRecommendation(_) => None,
        }
    }

    pub fn source(&self) -> Option<LockSource> {
        match self {
            WeeklyOutcome::Locked { source, .. } => Some(*source),
            WeeklyOutcome::NoRecommendation(_) => None,
        }
    }
}

/// Weekly lock over an injected store and provider.
pub struct WeeklyLock<'a> {
    store: &'a dyn LockStore,
    provider: &'a dyn MarketDataProvider,
    params: LockParams,
}

impl<'a> WeeklyLock<'a> {
    pub fn new(store: &'a dyn LockStore, provider: &'a dyn MarketDataProvider) -> Self {
        Self {
            store,
            provider,
            params: LockParams::default(),
        }
    }

    pub fn with_params(mut self, params: LockParams) -> Self {
        self.params = params;
        self
    }

    /// Recommendation for the ISO week containing `today`.
    ///
    /// `ytd` and `indicators` must be aligned. Only the ISO week number is
    /// compared against the stored slot.
    pub fn current_week(
        &self,
        today: NaiveDate,
        ytd: &PriceSeries,
        indicators: &MovingAverages,
    ) -> WeeklyOutcome {
        let week = today.iso_week().week();

        match self.store.load() {
            Ok(Some(record)) if record.week == week => {
                debug!(week, "weekly lock hit");
                return WeeklyOutcome::Locked {
                    recommendation: record.to_recommendation(),
                    source: LockSource::Cached,
                };
            }
            Ok(Some(record)) => debug!(stored = record.week, week, "weekly lock is stale"),
            Ok(None) => debug!(week, "weekly lock is empty"),
            Err(LockError::Corrupt(reason)) => {
                warn!(%reason, "weekly lock slot is corrupt, recomputing");
            }
            Err(e) => warn!(error = %e, "weekly lock unreadable, recomputing"),
        }

        let recommendation = match self.compute(week, ytd, indicators) {
            Ok(rec) => rec,
            Err(reason) => {
                info!(week, reason = reason.describe(), "no recommendation this week");
                return WeeklyOutcome::NoRecommendation(reason);
            }
        };

        let source = match self.store.save(&LockRecord::from_recommendation(&recommendation)) {
            Ok(()) => {
                info!(
                    week,
                    date = %recommendation.date,
                    position = %recommendation.position,
                    "locked weekly recommendation"
                );
                LockSource::Computed
            }
            Err(e) => {
                warn!(error = %e, "failed to persist weekly lock");
                LockSource::Provisional
            }
        };

        WeeklyOutcome::Locked {
            recommendation,
            source,
        }
    }

    /// Build a fresh recommendation. A failed chain fetch or a strike with
    /// no quote on the traded side leaves the levels blank.
    fn compute(
        &self,
        week: u32,
        ytd: &PriceSeries,
        indicators: &MovingAverages,
    ) -> Result<CurrentWeekRecommendation, NoRecommendation> {
        let anchor_index = resolve_anchor(ytd, indicators)?;
        let anchor = ytd.bars()[anchor_index];
        let position = indicators
            .triple_at(anchor_index)
            .ok_or(NoRecommendation::InsufficientHistory)?
            .classify();

        let symbol = ytd.symbol();
        let expirations = match self.provider.option_expirations(symbol) {
            Ok(exps) => exps,
            Err(e) => {
                warn!(symbol, error = %e, "failed to list option expirations");
                Vec::new()
            }
        };
        let expiration =
            nearest_expiration(&expirations, anchor.date).ok_or(NoRecommendation::NoExpirations)?;

        let mut rec = CurrentWeekRecommendation::bare(week, anchor.date, position);

        let Some(side) = position.option_side() else {
            return Ok(rec);
        };

        let chain = match self.provider.option_chain(symbol, expiration) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(symbol, %expiration, error = %e, "failed to fetch option chain");
                return Ok(rec);
            }
        };

        rec.atm_strike = chain.atm_strike(anchor.close);
        rec.option_price = rec
            .atm_strike
            .and_then(|strike| chain.last_price(side, strike));
        if let Some(price) = rec.option_price {
            rec.take_profit = Some(price * self.params.take_profit_multiplier);
            rec.stop_loss = Some(price * self.params.stop_loss_multiplier);
        } else {
            warn!(symbol, ?side, strike = ?rec.atm_strike, "no quote at the ATM strike");
        }

        Ok(rec)
    }
}

/// Index of the session the weekly signal is read from.
///
/// The latest Friday when its averages and close are defined; otherwise the
/// closest session (in calendar days) that has them, earlier date on a tie.
pub fn resolve_anchor(
    series: &PriceSeries,
    indicators: &MovingAverages,
) -> Result<usize, NoRecommendation> {
    let friday = series
        .last_friday_index()
        .ok_or(NoRecommendation::NoFridays)?;
    let bar = series.bars()[friday];

    if bar.has_close() && indicators.triple_at(friday).is_some() {
        return Ok(friday);
    }

    let nearest = indicators
        .nearest_defined(series.bars(), bar.date)
        .ok_or(NoRecommendation::InsufficientHistory)?;
    debug!(
        friday = %bar.date,
        resolved = %series.bars()[nearest].date,
        "Friday lacks averages, using nearest session"
    );
    Ok(nearest)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data::{DataError, DataSource};
    use crate::domain::{OptionChain, OptionQuote, PositionSignal, PriceBar};
    use crate::indicators::make_bars;
    use crate::lock::MemoryLockStore;

    fn series(closes: &[f64]) -> (PriceSeries, MovingAverages) {
        let s = PriceSeries::new("SPY", make_bars(closes)).unwrap();
        let ma = MovingAverages::standard(s.bars());
        (s, ma)
    }

    #[test]
    fn anchor_is_last_friday_when_defined() {
        let (s, ma) = series(&[100.0; 62]);
        // Fridays at 49, 54, 59; 60-61 are Mon/Tue.
        assert_eq!(resolve_anchor(&s, &ma), Ok(59));
    }

    #[test]
    fn anchor_falls_forward_when_friday_is_in_warmup() {
        let (s, ma) = series(&[100.0; 52]);
        assert_eq!(resolve_anchor(&s, &ma), Ok(49));

        let mut bars = make_bars(&[100.0; 51]);
        bars.remove(49); // drop Friday 49; last Friday is now 44
        let s = PriceSeries::new("SPY", bars).unwrap();
        let ma = MovingAverages::standard(s.bars());
        // Index 49 (the following Monday) is the first defined session.
        let idx = resolve_anchor(&s, &ma).unwrap();
        assert_eq!(idx, 49);
        assert_eq!(s.bars()[idx].weekday(), 0);
    }

    #[test]
    fn anchor_errors() {
        let (s, ma) = series(&[100.0; 4]);
        assert_eq!(resolve_anchor(&s, &ma), Err(NoRecommendation::NoFridays));

        let (s, ma) = series(&[100.0; 20]);
        assert_eq!(
            resolve_anchor(&s, &ma),
            Err(NoRecommendation::InsufficientHistory)
        );
    }

    #[test]
    fn anchor_skips_friday_with_missing_close() {
        let mut bars = make_bars(&[100.0; 60]);
        bars[59].close = f64::NAN; // last bar, a Friday
        let s = PriceSeries::new("SPY", bars).unwrap();
        let ma = MovingAverages::standard(s.bars());
        assert_eq!(resolve_anchor(&s, &ma), Ok(58));
    }

    struct FakeProvider {
        expirations: Vec<NaiveDate>,
        chain: Option<OptionChain>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(expirations: Vec<NaiveDate>, chain: Option<OptionChain>) -> Self {
            Self {
                expirations,
                chain,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MarketDataProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn source(&self) -> DataSource {
            DataSource::Fixture
        }

        fn daily_bars(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, DataError> {
            Ok(Vec::new())
        }

        fn option_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.expirations.clone())
        }

        fn option_chain(
            &self,
            symbol: &str,
            expiration: NaiveDate,
        ) -> Result<OptionChain, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.chain.clone().ok_or_else(|| DataError::NoOptionChain {
                symbol: symbol.to_string(),
                expiration,
            })
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quote(strike: f64, last_price: f64) -> OptionQuote {
        OptionQuote { strike, last_price }
    }

    fn chain() -> OptionChain {
        OptionChain {
            expiration: d(2024, 3, 22),
            calls: vec![quote(99.0, 2.5), quote(100.0, 2.0), quote(101.0, 1.5)],
            puts: vec![quote(99.0, 1.2), quote(100.0, 1.6), quote(101.0, 2.1)],
        }
    }

    // Index 59 is Friday 2024-03-22; the closes end at 100.0.
    fn rising() -> (PriceSeries, MovingAverages) {
        series(&(0..60).map(|i| 41.0 + i as f64).collect::<Vec<_>>())
    }

    fn falling() -> (PriceSeries, MovingAverages) {
        series(&(0..60).map(|i| 159.0 - i as f64).collect::<Vec<_>>())
    }

    /// Monday of ISO week 13.
    fn today() -> NaiveDate {
        d(2024, 3, 25)
    }

    #[test]
    fn bullish_week_is_priced_and_locked() {
        let (s, ma) = rising();
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 29), d(2024, 3, 22)], Some(chain()));
        let lock = WeeklyLock::new(&store, &provider);

        let outcome = lock.current_week(today(), &s, &ma);
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        let rec = outcome.recommendation().unwrap();
        assert_eq!(rec.iso_week, 13);
        assert_eq!(rec.date, d(2024, 3, 22));
        assert_eq!(rec.position, PositionSignal::BullishCall);
        assert_eq!(rec.atm_strike, Some(100.0));
        assert_eq!(rec.option_price, Some(2.0));
        assert!((rec.take_profit.unwrap() - 2.2).abs() < 1e-12);
        assert!((rec.stop_loss.unwrap() - 1.9).abs() < 1e-12);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.load().unwrap().unwrap().week, 13);
    }

    #[test]
    fn same_week_returns_cache_without_fetching() {
        let (s, ma) = rising();
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));
        let lock = WeeklyLock::new(&store, &provider);

        let first = lock.current_week(today(), &s, &ma);
        let fetches = provider.calls();
        // Thursday of the same ISO week, with different data.
        let (s2, ma2) = falling();
        let second = lock.current_week(d(2024, 3, 28), &s2, &ma2);

        assert_eq!(second.source(), Some(LockSource::Cached));
        assert_eq!(second.recommendation(), first.recommendation());
        assert_eq!(provider.calls(), fetches);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn new_week_replaces_stale_slot() {
        let (s, ma) = falling();
        let stale = CurrentWeekRecommendation::bare(12, d(2024, 3, 15), PositionSignal::Straddle);
        let store = MemoryLockStore::new();
        store.save(&LockRecord::from_recommendation(&stale)).unwrap();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        let rec = outcome.recommendation().unwrap();
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        assert_eq!(rec.position, PositionSignal::BearishPut);
        // Last close is 100.0; puts are priced off the same ATM strike.
        assert_eq!(rec.atm_strike, Some(100.0));
        assert_eq!(rec.option_price, Some(1.6));
        assert_eq!(store.load().unwrap().unwrap().week, 13);
    }

    #[test]
    fn corrupt_slot_is_recomputed() {
        let (s, ma) = rising();
        let store = MemoryLockStore::with_raw("{\"week\": 13, \"trade\": [");
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        assert!(store.load().is_ok());
    }

    #[test]
    fn straddle_locks_blank_levels_without_chain() {
        let (s, ma) = series(&[100.0; 60]);
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], None);

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        let rec = outcome.recommendation().unwrap();
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        assert_eq!(rec.position, PositionSignal::Straddle);
        assert!(!rec.has_levels());
        assert_eq!(rec.atm_strike, None);
        // Expirations listed once, chain never requested.
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn chain_failure_locks_blank_levels() {
        let (s, ma) = rising();
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], None);
        let lock = WeeklyLock::new(&store, &provider);

        let outcome = lock.current_week(today(), &s, &ma);
        let rec = outcome.recommendation().unwrap();
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        assert_eq!(rec.position, PositionSignal::BullishCall);
        assert_eq!(rec.atm_strike, None);
        assert_eq!(rec.option_price, None);
        assert_eq!(store.write_count(), 1);
        assert!(store.raw().unwrap().contains("\"ATM Strike\":\"\""));

        // Tuesday of the same ISO week: served from the slot.
        let fetches = provider.calls();
        let again = lock.current_week(d(2024, 3, 26), &s, &ma);
        assert_eq!(again.source(), Some(LockSource::Cached));
        assert_eq!(again.recommendation(), outcome.recommendation());
        assert_eq!(provider.calls(), fetches);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn missing_strike_on_side_locks_blank_levels() {
        let (s, ma) = falling();
        let mut c = chain();
        c.puts.retain(|q| q.strike != 100.0);
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(c));
        let lock = WeeklyLock::new(&store, &provider);

        let outcome = lock.current_week(today(), &s, &ma);
        let rec = outcome.recommendation().unwrap();
        assert_eq!(outcome.source(), Some(LockSource::Computed));
        assert_eq!(rec.atm_strike, Some(100.0));
        assert_eq!(rec.option_price, None);
        assert_eq!(rec.take_profit, None);
        assert_eq!(store.write_count(), 1);

        let fetches = provider.calls();
        let again = lock.current_week(d(2024, 3, 27), &s, &ma);
        assert_eq!(again.source(), Some(LockSource::Cached));
        assert_eq!(provider.calls(), fetches);
    }

    /// Store whose reads and writes fail with I/O errors.
    struct BrokenStore {
        saves: AtomicUsize,
    }

    impl BrokenStore {
        fn new() -> Self {
            Self {
                saves: AtomicUsize::new(0),
            }
        }

        fn io_error() -> LockError {
            LockError::Io {
                path: "current_week_trade.json".into(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only volume",
                ),
            }
        }
    }

    impl LockStore for BrokenStore {
        fn load(&self) -> Result<Option<LockRecord>, LockError> {
            Err(Self::io_error())
        }

        fn save(&self, _record: &LockRecord) -> Result<(), LockError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(Self::io_error())
        }

        fn clear(&self) -> Result<(), LockError> {
            Err(Self::io_error())
        }
    }

    #[test]
    fn failed_save_still_returns_recommendation() {
        let (s, ma) = rising();
        let store = BrokenStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        assert_eq!(outcome.source(), Some(LockSource::Provisional));
        let rec = outcome.recommendation().unwrap();
        assert_eq!(rec.position, PositionSignal::BullishCall);
        assert_eq!(rec.option_price, Some(2.0));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unreadable_slot_is_recomputed() {
        let (s, ma) = rising();
        let store = BrokenStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));
        let lock = WeeklyLock::new(&store, &provider);

        let first = lock.current_week(today(), &s, &ma);
        let fetches = provider.calls();
        assert_eq!(fetches, 2);

        // Nothing could be stored, so every request goes back to the provider.
        let second = lock.current_week(d(2024, 3, 26), &s, &ma);
        assert_eq!(second.recommendation(), first.recommendation());
        assert_eq!(provider.calls(), 2 * fetches);
    }

    #[test]
    fn no_expirations_means_no_recommendation() {
        let (s, ma) = rising();
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(Vec::new(), Some(chain()));

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        assert_eq!(
            outcome,
            WeeklyOutcome::NoRecommendation(NoRecommendation::NoExpirations)
        );
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn short_history_means_no_recommendation() {
        let (s, ma) = series(&[100.0; 30]);
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));

        let outcome = WeeklyLock::new(&store, &provider).current_week(today(), &s, &ma);
        assert_eq!(
            outcome,
            WeeklyOutcome::NoRecommendation(NoRecommendation::InsufficientHistory)
        );
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn custom_multipliers_apply() {
        let (s, ma) = rising();
        let store = MemoryLockStore::new();
        let provider = FakeProvider::new(vec![d(2024, 3, 22)], Some(chain()));
        let params = LockParams {
            take_profit_multiplier: 1.5,
            stop_loss_multiplier: 0.5,
        };

        let outcome = WeeklyLock::new(&store, &provider)
            .with_params(params)
            .current_week(today(), &s, &ma);
        let rec = outcome.recommendation().unwrap();
        assert_eq!(rec.take_profit, Some(3.0));
        assert_eq!(rec.stop_loss, Some(1.0));
    }

    #[test]
    fn lock_params_validate() {
        assert!(LockParams::default().validate().is_ok());
        let bad = LockParams {
            stop_loss_multiplier: -1.0,
            ..Default::default()
        };
        assert_eq!(
            bad.validate(),
            Err(LockParamsError {
                name: "stop_loss_multiplier",
                value: -1.0
            })
        );
    }
}
