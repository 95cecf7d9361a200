//! Aggregation: volume per bin, POC location, and the assembled profile.

use serde::{Deserialize, Serialize};

use super::binner::{Assignment, Partition};
use super::error::ProfileError;
use super::range::PriceRange;
use super::Attribution;
use crate::domain::Observation;

/// One row of a volume profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLevel {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub midpoint: f64,
    pub accumulated_volume: f64,
    pub is_poc: bool,
}

/// Complete volume profile for one series.
///
/// `levels` is ordered by ascending lower bound and holds one entry per bin,
/// including bins that accumulated nothing. Exactly one level has `is_poc` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub levels: Vec<ProfileLevel>,
    pub poc_index: usize,
    pub poc_price: f64,
    pub poc_volume: f64,
    pub total_volume: f64,
    /// Close of the most recent observation, passed through.
    pub current_price: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub bin_width: f64,
    pub observation_count: usize,
    pub attribution: Attribution,
}

impl VolumeProfile {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn poc(&self) -> &ProfileLevel {
        &self.levels[self.poc_index]
    }

    /// Re-scan the levels for the POC; always agrees with `poc_index`.
    pub fn recompute_poc(&self) -> Option<usize> {
        locate_poc(self.levels.iter().map(|l| l.accumulated_volume))
    }

    /// Share of total volume held by the POC bin, in `[0, 1]`.
    pub fn poc_share(&self) -> f64 {
        if self.total_volume > 0.0 {
            self.poc_volume / self.total_volume
        } else {
            0.0
        }
    }
}

/// Index of the first maximum. Lower index (lower price) wins exact ties.
pub fn locate_poc<I>(volumes: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in volumes.into_iter().enumerate() {
        match best {
            None => best = Some((i, v)),
            Some((_, max)) if v > max => best = Some((i, v)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

/// Sum each bin's member volumes, in series order.
///
/// `assignment` must come from `observations`; indices past its end are skipped.
pub(crate) fn accumulate_closes(assignment: &Assignment, observations: &[Observation]) -> Vec<f64> {
    assignment
        .iter()
        .map(|members| {
            members
                .iter()
                .filter_map(|&i| observations.get(i))
                .map(|o| o.volume)
                .sum()
        })
        .collect()
}

/// Spread each bar's volume over the bins its `[low, high]` range overlaps,
/// proportionally to overlap length.
///
/// Bars with no usable range inside the partition fall back to their close's
/// bin. The rounding remainder of each bar also goes to the close's bin so
/// per-bar volume is conserved.
pub fn accumulate_ranges(partition: &Partition, observations: &[Observation]) -> Vec<f64> {
    let mut volumes = vec![0.0; partition.len()];
    if volumes.is_empty() {
        return volumes;
    }

    for obs in observations {
        let close_bin = partition.locate(obs.close);
        let lo = obs.low.max(partition.lower());
        let hi = obs.high.min(partition.upper());
        let span = hi - lo;

        if !(span > 0.0) {
            volumes[close_bin] += obs.volume;
            continue;
        }

        let mut distributed = 0.0;
        for k in partition.locate(lo)..=partition.locate(hi) {
            let bin = partition.bin(k);
            let overlap = hi.min(bin.upper) - lo.max(bin.lower);
            if overlap > 0.0 {
                let share = obs.volume * overlap / span;
                volumes[k] += share;
                distributed += share;
            }
        }
        volumes[close_bin] += obs.volume - distributed;
    }

    volumes
}

/// Assemble the profile from the partition and per-bin volumes.
pub fn build_profile(
    partition: &Partition,
    volumes: &[f64],
    range: PriceRange,
    observations: &[Observation],
    attribution: Attribution,
) -> Result<VolumeProfile, ProfileError> {
    if partition.is_empty() || volumes.len() != partition.len() {
        return Err(ProfileError::EmptyProfile);
    }

    let poc_index = locate_poc(volumes.iter().copied()).ok_or(ProfileError::EmptyProfile)?;

    let levels: Vec<ProfileLevel> = partition
        .bins()
        .zip(volumes)
        .enumerate()
        .map(|(i, (bin, &volume))| ProfileLevel {
            lower_bound: bin.lower,
            upper_bound: bin.upper,
            midpoint: bin.midpoint(),
            accumulated_volume: volume,
            is_poc: i == poc_index,
        })
        .collect();

    let total_volume: f64 = volumes.iter().sum();
    let poc_price = levels[poc_index].midpoint;
    let poc_volume = levels[poc_index].accumulated_volume;

    Ok(VolumeProfile {
        poc_index,
        poc_price,
        poc_volume,
        total_volume,
        current_price: observations.last().map_or(f64::NAN, |o| o.close),
        price_min: range.min,
        price_max: range.max,
        bin_width: partition.width(),
        observation_count: observations.len(),
        attribution,
        levels,
    })
}
