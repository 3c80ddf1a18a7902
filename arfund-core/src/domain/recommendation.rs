//! CurrentWeekRecommendation: the position locked for one ISO week.

use super::position::PositionSignal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Take-profit multiplier applied to the option premium.
pub const TAKE_PROFIT_MULTIPLIER: f64 = 1.10;

/// Stop-loss multiplier applied to the option premium.
pub const STOP_LOSS_MULTIPLIER: f64 = 0.95;

/// The recommendation shown for the current week.
///
/// Strike and price levels are only filled in for directional positions
/// whose option chain could be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeekRecommendation {
    /// ISO week the recommendation was locked for.
    pub iso_week: u32,
    /// Session the signal was read from (normally the last Friday).
    pub date: NaiveDate,
    pub position: PositionSignal,
    pub atm_strike: Option<f64>,
    pub option_price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl CurrentWeekRecommendation {
    /// Recommendation with no option levels attached.
    pub fn bare(iso_week: u32, date: NaiveDate, position: PositionSignal) -> Self {
        Self {
            iso_week,
            date,
            position,
            atm_strike: None,
            option_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    /// True when a directional position has its full set of levels.
    pub fn has_levels(&self) -> bool {
        self.atm_strike.is_some()
            && self.option_price.is_some()
            && self.take_profit.is_some()
            && self.stop_loss.is_some()
    }
}
