//! Range resolution: the price domain a profile partitions.

use serde::{Deserialize, Serialize};

use super::error::ProfileError;
use crate::domain::Observation;

/// Closed price interval `[min, max]` spanned by a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Zero-width range (single observation or flat prices).
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }
}

/// `min(low)` and `max(high)` across the series.
///
/// NaN lows/highs are skipped; a series with no finite extreme at all is
/// reported as a degenerate range since nothing can be partitioned.
pub fn resolve_range(observations: &[Observation]) -> Result<PriceRange, ProfileError> {
    if observations.is_empty() {
        return Err(ProfileError::EmptySeries);
    }

    let (min, max) = observations.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), obs| (lo.min(obs.low), hi.max(obs.high)),
    );

    if !min.is_finite() || !max.is_finite() {
        return Err(ProfileError::DegenerateRange { price: min });
    }

    Ok(PriceRange { min, max })
}
