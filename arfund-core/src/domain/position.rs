//! PositionSignal: the three weekly position states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::option::OptionSide;

/// Default leverage applied to directional weeks.
pub const DIRECTIONAL_LEVERAGE: f64 = 3.0;

/// Default leverage applied to straddle weeks.
pub const STRADDLE_LEVERAGE: f64 = 2.0;

/// Weekly position derived from one date's moving averages.
///
/// Serialized with the display labels used in the weekly lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSignal {
    #[serde(rename = "Bullish Call")]
    BullishCall,
    #[serde(rename = "Bearish Put")]
    BearishPut,
    #[serde(rename = "Straddle")]
    Straddle,
}

impl PositionSignal {
    pub const ALL: [PositionSignal; 3] = [
        PositionSignal::BullishCall,
        PositionSignal::BearishPut,
        PositionSignal::Straddle,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PositionSignal::BullishCall => "Bullish Call",
            PositionSignal::BearishPut => "Bearish Put",
            PositionSignal::Straddle => "Straddle",
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, PositionSignal::Straddle)
    }

    /// Option side traded for a directional position; `None` for a straddle.
    pub fn option_side(&self) -> Option<OptionSide> {
        match self {
            PositionSignal::BullishCall => Some(OptionSide::Call),
            PositionSignal::BearishPut => Some(OptionSide::Put),
            PositionSignal::Straddle => None,
        }
    }

    /// Default leverage factor: 3 for directional, 2 for straddle.
    pub fn default_leverage(&self) -> f64 {
        if self.is_directional() {
            DIRECTIONAL_LEVERAGE
        } else {
            STRADDLE_LEVERAGE
        }
    }

    /// Unleveraged return of holding this position from `entry` to `exit`.
    ///
    /// Calls gain on a rise, puts gain on a fall, and the straddle gains on
    /// movement in either direction.
    pub fn raw_return(&self, entry: f64, exit: f64) -> f64 {
        match self {
            PositionSignal::BullishCall => exit / entry - 1.0,
            PositionSignal::BearishPut => entry / exit - 1.0,
            PositionSignal::Straddle => (exit / entry - 1.0).abs(),
        }
    }
}

impl fmt::Display for PositionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PositionSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PositionSignal::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown position '{s}'"))
    }
}
