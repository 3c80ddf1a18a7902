//! Strategy parameters shared by the indicator calculator and the backtest.

use crate::domain::PositionSignal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("moving-average windows must be strictly increasing and >= 1 (got {fast}/{mid}/{slow})")]
    Windows { fast: usize, mid: usize, slow: usize },

    #[error("holding_sessions must be >= 1")]
    HoldingSessions,

    #[error("{name} must be a positive finite number (got {value})")]
    NonPositive { name: &'static str, value: f64 },
}

/// Moving-average windows, holding period, and leverage factors.
///
/// Defaults reproduce the 5/20/50 crossover with a five-session hold,
/// 3x directional and 2x straddle leverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub fast_window: usize,
    pub mid_window: usize,
    pub slow_window: usize,
    pub holding_sessions: usize,
    pub directional_leverage: f64,
    pub straddle_leverage: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            fast_window: 5,
            mid_window: 20,
            slow_window: 50,
            holding_sessions: 5,
            directional_leverage: PositionSignal::BullishCall.default_leverage(),
            straddle_leverage: PositionSignal::Straddle.default_leverage(),
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.fast_window == 0
            || self.fast_window >= self.mid_window
            || self.mid_window >= self.slow_window
        {
            return Err(ParamsError::Windows {
                fast: self.fast_window,
                mid: self.mid_window,
                slow: self.slow_window,
            });
        }
        if self.holding_sessions == 0 {
            return Err(ParamsError::HoldingSessions);
        }
        for (name, value) in [
            ("directional_leverage", self.directional_leverage),
            ("straddle_leverage", self.straddle_leverage),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParamsError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    pub fn leverage_for(&self, position: PositionSignal) -> f64 {
        if position.is_directional() {
            self.directional_leverage
        } else {
            self.straddle_leverage
        }
    }

    /// Bars needed before every window is defined.
    pub fn warmup_bars(&self) -> usize {
        self.slow_window.saturating_sub(1)
    }
}
