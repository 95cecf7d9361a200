//! Observation: one OHLCV record for a single trading period.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV record for a single trading period.
///
/// Series of observations are ordered by `timestamp` ascending with unique
/// timestamps. Volume is kept as `f64` so that both share counts and
/// fractional (crypto) volumes fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Observation {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: positive finite prices, `low <= {open, close} <= high`,
    /// non-negative volume.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }
}

/// Returns true if timestamps are strictly increasing.
pub fn is_chronological(observations: &[Observation]) -> bool {
    observations
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp)
}
