//! Year-to-date trades grouped by calendar month.

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use arfund_core::domain::{PositionSignal, Trade};

/// One row of a month table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub date: NaiveDate,
    pub position: PositionSignal,
    pub entry_price: f64,
    pub exit_price: f64,
    pub weekly_return: f64,
    /// The trade's ISO week number matches today's.
    pub current_week: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    /// 1 through 12.
    pub month: u32,
    pub name: String,
    pub rows: Vec<CalendarRow>,
}

impl CalendarMonth {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compounded return of the month's trades.
    pub fn compounded_return(&self) -> f64 {
        self.rows
            .iter()
            .fold(1.0, |acc, r| (acc * (1.0 + r.weekly_return)).max(0.0))
            - 1.0
    }
}

/// All twelve months, in order, each holding that month's trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCalendar {
    pub year: i32,
    pub months: Vec<CalendarMonth>,
}

impl MonthlyCalendar {
    /// Group `trades` by their month tag; rows keep trade order.
    pub fn build(trades: &[Trade], today: NaiveDate) -> Self {
        let current_week = today.iso_week().week();

        let months = (1..=12u32)
            .map(|month| CalendarMonth {
                month,
                name: month_name(month).to_string(),
                rows: trades
                    .iter()
                    .filter(|t| t.month == month)
                    .map(|t| CalendarRow {
                        date: t.date,
                        position: t.position,
                        entry_price: t.entry_price,
                        exit_price: t.exit_price,
                        weekly_return: t.weekly_return,
                        current_week: t.iso_week == current_week,
                    })
                    .collect(),
            })
            .collect();

        Self {
            year: today.year(),
            months,
        }
    }

    pub fn trade_count(&self) -> usize {
        self.months.iter().map(|m| m.rows.len()).sum()
    }

    pub fn current_week_rows(&self) -> impl Iterator<Item = &CalendarRow> {
        self.months
            .iter()
            .flat_map(|m| m.rows.iter())
            .filter(|r| r.current_week)
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}
