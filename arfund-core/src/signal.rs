//! Signal classifier: maps one date's moving averages to a position.
//!
//! Directional positions need strict ordering of all three averages. Any
//! equality or mixed ordering is a straddle.

use crate::domain::PositionSignal;

/// Defined fast / mid / slow averages for a single date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaTriple {
    pub fast: f64,
    pub mid: f64,
    pub slow: f64,
}

impl SmaTriple {
    pub fn new(fast: f64, mid: f64, slow: f64) -> Self {
        Self { fast, mid, slow }
    }

    pub fn classify(&self) -> PositionSignal {
        classify(*self)
    }
}

/// Classify a defined triple.
///
/// - `mid > slow && fast > mid` → `BullishCall`
/// - `mid < slow && fast < mid` → `BearishPut`
/// - anything else → `Straddle`
pub fn classify(t: SmaTriple) -> PositionSignal {
    if t.mid > t.slow && t.fast > t.mid {
        PositionSignal::BullishCall
    } else if t.mid < t.slow && t.fast < t.mid {
        PositionSignal::BearishPut
    } else {
        PositionSignal::Straddle
    }
}
