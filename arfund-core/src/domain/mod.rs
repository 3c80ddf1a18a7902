//! Domain types for the weekly signal dashboard

pub mod bar;
pub mod option;
pub mod position;
pub mod recommendation;
pub mod trade;

pub use bar::{PriceBar, PriceSeries, SeriesError};
pub use option::{nearest_expiration, OptionChain, OptionQuote, OptionSide};
pub use position::{PositionSignal, DIRECTIONAL_LEVERAGE, STRADDLE_LEVERAGE};
pub use recommendation::{CurrentWeekRecommendation, STOP_LOSS_MULTIPLIER, TAKE_PROFIT_MULTIPLIER};
pub use trade::Trade;
