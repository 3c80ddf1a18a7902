//! Price history loading for the dashboard windows.
//!
//! Given a provider and a date range, fetch daily bars and turn them into a
//! validated `PriceSeries`. Loading never fails: a provider error or an empty
//! response yields an empty series plus a data-quality warning, and the
//! backtests downstream simply produce no trades.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use arfund_core::data::{DataSource, MarketDataProvider};
use arfund_core::domain::PriceSeries;

/// Inclusive date range for one backtest window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// `years` back from `today`, ending yesterday.
    pub fn trailing_years(today: NaiveDate, years: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(years * 12))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: yesterday(today),
        }
    }

    /// January 1st of `today`'s year through yesterday.
    pub fn year_to_date(today: NaiveDate) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            end: yesterday(today),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// A loaded series with provenance and anything worth flagging about it.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
    pub warnings: Vec<String>,
}

/// Fetch `symbol` over `window` and validate the result.
pub fn load_window(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    window: Window,
    label: &str,
) -> LoadedSeries {
    let mut warnings = Vec::new();
    let source = provider.source();

    if window.is_empty() {
        warnings.push(format!("{label}: empty date range {} to {}", window.start, window.end));
        return LoadedSeries {
            series: PriceSeries::empty(symbol),
            source,
            warnings,
        };
    }

    if !provider.is_available() {
        warn!(symbol, label, provider = provider.name(), "provider is refusing requests");
        warnings.push(format!("{label}: {} is refusing requests", provider.name()));
        return LoadedSeries {
            series: PriceSeries::empty(symbol),
            source,
            warnings,
        };
    }

    let bars = match provider.daily_bars(symbol, window.start, window.end) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(
                symbol,
                label,
                provider = provider.name(),
                error = %e,
                "price history unavailable"
            );
            warnings.push(format!("{label}: price history unavailable ({e})"));
            Vec::new()
        }
    };

    let bars: Vec<_> = bars
        .into_iter()
        .filter(|b| b.date >= window.start && b.date <= window.end)
        .collect();
    let fetched = bars.len();

    let series = match PriceSeries::new(symbol, bars.clone()) {
        Ok(series) => series,
        Err(e) => {
            warn!(symbol, label, error = %e, "provider returned unordered bars, sorting");
            warnings.push(format!("{label}: {e}; bars were re-sorted"));
            PriceSeries::from_unsorted(symbol, bars)
        }
    };

    if series.len() < fetched {
        warnings.push(format!(
            "{label}: dropped {} duplicate sessions",
            fetched - series.len()
        ));
    }
    if series.is_empty() {
        warnings.push(format!("{label}: no sessions between {} and {}", window.start, window.end));
    }
    let missing = series.missing_close_count();
    if missing > 0 {
        warnings.push(format!("{label}: {missing} sessions have no close"));
    }
    if source == DataSource::Synthetic {
        warnings.push(format!("{label}: SYNTHETIC data, results are not real"));
    }

    info!(
        symbol,
        label,
        bars = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        source = ?source,
        "loaded price history"
    );

    LoadedSeries {
        series,
        source,
        warnings,
    }
}

/// Deterministic BLAKE3 hash over the bars of every loaded series.
///
/// Covers symbol, dates, and close bits in the order given, so the same
/// inputs always hash the same regardless of where they came from.
pub fn compute_dataset_hash(series: &[&PriceSeries]) -> String {
    let mut hasher = blake3::Hasher::new();

    for s in series {
        hasher.update(s.symbol().as_bytes());
        hasher.update(&(s.len() as u64).to_le_bytes());
        for bar in s.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.close.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
