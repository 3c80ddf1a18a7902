//! On-disk shape of the weekly lock slot.
//!
//! ```json
//! {"week": 10, "trade": {"Date": "2024-03-08", "Position": "Bullish Call",
//!   "ATM Strike": 510.0, "Option Price": 6.1, "TP": 6.71, "SL": 5.795}}
//! ```
//!
//! Absent levels are written as `""`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CurrentWeekRecommendation, PositionSignal};

/// The single cached slot: the ISO week it belongs to and its recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub week: u32,
    pub trade: LockedTrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedTrade {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Position")]
    pub position: PositionSignal,
    #[serde(rename = "ATM Strike", default, with = "blank_or_number")]
    pub atm_strike: Option<f64>,
    #[serde(rename = "Option Price", default, with = "blank_or_number")]
    pub option_price: Option<f64>,
    #[serde(rename = "TP", default, with = "blank_or_number")]
    pub take_profit: Option<f64>,
    #[serde(rename = "SL", default, with = "blank_or_number")]
    pub stop_loss: Option<f64>,
}

impl LockRecord {
    pub fn from_recommendation(rec: &CurrentWeekRecommendation) -> Self {
        Self {
            week: rec.iso_week,
            trade: LockedTrade {
                date: rec.date,
                position: rec.position,
                atm_strike: rec.atm_strike,
                option_price: rec.option_price,
                take_profit: rec.take_profit,
                stop_loss: rec.stop_loss,
            },
        }
    }

    pub fn to_recommendation(&self) -> CurrentWeekRecommendation {
        CurrentWeekRecommendation {
            iso_week: self.week,
            date: self.trade.date,
            position: self.trade.position,
            atm_strike: self.trade.atm_strike,
            option_price: self.trade.option_price,
            take_profit: self.trade.take_profit,
            stop_loss: self.trade.stop_loss,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `Option<f64>` written as a number, or `""` when absent.
mod blank_or_number {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => s.serialize_f64(*v),
            _ => s.serialize_str(""),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null(()),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(v) => Ok(Some(v)),
            Raw::Text(t) if t.trim().is_empty() => Ok(None),
            Raw::Text(t) => t
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a number or \"\", got {t:?}"))),
            Raw::Null(()) => Ok(None),
        }
    }
}
