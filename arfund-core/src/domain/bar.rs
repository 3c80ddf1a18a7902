//! PriceBar and PriceSeries: the daily close history everything else reads.

use chrono::{Datelike, IsoWeek, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading session's close for the tracked symbol.
///
/// A non-finite or non-positive close is treated as missing: indicator
/// windows containing it are undefined and it can never anchor or exit a trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Day of week, Monday = 0 through Sunday = 6.
    pub fn weekday(&self) -> u8 {
        self.date.weekday().num_days_from_monday() as u8
    }

    pub fn is_friday(&self) -> bool {
        self.date.weekday() == Weekday::Fri
    }

    pub fn iso_week(&self) -> IsoWeek {
        self.date.iso_week()
    }

    /// True if the close is usable as a price.
    pub fn has_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Ordering violations detected when building a [`PriceSeries`].
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar {index} dated {date} is earlier than the previous bar ({previous})")]
    OutOfOrder {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),
}

/// Daily bars for one symbol, strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting unordered or duplicated dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            let (prev, cur) = (pair[0].date, pair[1].date);
            if cur == prev {
                return Err(SeriesError::DuplicateDate(cur));
            }
            if cur < prev {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    previous: prev,
                    date: cur,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Sort provider output by date and keep the last bar seen for a repeated date.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Indices of every Friday session, ascending.
    pub fn friday_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_friday())
            .map(|(i, _)| i)
    }

    /// Index of the most recent Friday session, if any.
    pub fn last_friday_index(&self) -> Option<usize> {
        self.bars.iter().rposition(|b| b.is_friday())
    }

    /// Number of bars whose close is missing.
    pub fn missing_close_count(&self) -> usize {
        self.bars.iter().filter(|b| !b.has_close()).count()
    }
}
