//! Volume profile pipeline.
//!
//! Three stages run synchronously for each call:
//! 1. Range resolution: `min(low)` / `max(high)` across the series
//! 2. Binning: equal-width partition, each close assigned to one bin
//! 3. Aggregation: volume summed per bin, first maximum marked as the POC
//!
//! The pipeline holds no state between calls; identical inputs give
//! bit-identical profiles.

pub mod aggregate;
pub mod binner;
pub mod error;
pub mod export;
pub mod range;

pub use aggregate::{locate_poc, ProfileLevel, VolumeProfile};
pub use binner::{
    assign_closes, Assignment, Bin, Partition, DEFAULT_EPSILON_RATIO, MAX_BIN_COUNT,
};
pub use error::ProfileError;
pub use export::ExportError;
pub use range::{resolve_range, PriceRange};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::domain::Observation;

/// How an observation's volume is attributed to price bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribution {
    /// Whole volume to the bin holding the close.
    #[default]
    Close,
    /// Volume spread across the bins overlapped by `[low, high]`.
    Range,
}

impl Attribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribution::Close => "close",
            Attribution::Range => "range",
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(Attribution::Close),
            "range" => Ok(Attribution::Range),
            other => Err(format!("unknown attribution '{other}' (expected close or range)")),
        }
    }
}

/// Parameters for one profile computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileOptions {
    pub bin_count: usize,
    pub attribution: Attribution,
    /// Half-width of the single bin used for a zero-width range, as a
    /// fraction of the price.
    pub degenerate_epsilon_ratio: f64,
}

impl ProfileOptions {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bin_count,
            attribution: Attribution::Close,
            degenerate_epsilon_ratio: DEFAULT_EPSILON_RATIO,
        }
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn with_epsilon_ratio(mut self, ratio: f64) -> Self {
        self.degenerate_epsilon_ratio = ratio;
        self
    }
}

/// Compute the close-attributed volume profile of `observations` over `bin_count` bins.
pub fn compute_volume_profile(
    observations: &[Observation],
    bin_count: usize,
) -> Result<VolumeProfile, ProfileError> {
    compute_volume_profile_with(observations, &ProfileOptions::new(bin_count))
}

/// Compute a volume profile with explicit options.
pub fn compute_volume_profile_with(
    observations: &[Observation],
    opts: &ProfileOptions,
) -> Result<VolumeProfile, ProfileError> {
    let range = resolve_range(observations)?;
    let partition = Partition::new(range, opts.bin_count, opts.degenerate_epsilon_ratio)?;
    debug!(
        min = range.min,
        max = range.max,
        bins = partition.len(),
        width = partition.width(),
        degenerate = partition.is_degenerate(),
        "partitioned price range"
    );

    let volumes = match opts.attribution {
        Attribution::Close => {
            let assignment = assign_closes(&partition, observations);
            if assignment.is_empty() {
                return Err(ProfileError::EmptyProfile);
            }
            aggregate::accumulate_closes(&assignment, observations)
        }
        Attribution::Range => aggregate::accumulate_ranges(&partition, observations),
    };

    let profile = aggregate::build_profile(
        &partition,
        &volumes,
        range,
        observations,
        opts.attribution,
    )?;
    debug!(
        poc_index = profile.poc_index,
        poc_price = profile.poc_price,
        poc_volume = profile.poc_volume,
        total_volume = profile.total_volume,
        "located point of control"
    );
    Ok(profile)
}
