//! Trade: one simulated week anchored on a Friday close.

use super::position::PositionSignal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single backtested week.
///
/// `weekly_return` already includes leverage when the run was leveraged.
/// `cumulative` is the capital multiplier after this week, compounded from 1.0
/// across every earlier trade in the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Anchor Friday.
    pub date: NaiveDate,
    /// Session whose close priced the exit (at most five sessions later).
    pub exit_date: NaiveDate,
    pub position: PositionSignal,
    pub entry_price: f64,
    pub exit_price: f64,
    pub weekly_return: f64,
    pub cumulative: f64,
    /// Calendar month of the anchor, 1 through 12.
    pub month: u32,
    /// ISO-8601 week number of the anchor.
    pub iso_week: u32,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.weekly_return > 0.0
    }

    /// Calendar days between entry and exit; zero when the anchor is the
    /// last bar.
    pub fn holding_calendar_days(&self) -> i64 {
        (self.exit_date - self.date).num_days()
    }
}
