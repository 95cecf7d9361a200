//! Binner: equal-width partition of the price range and close-price assignment.
//!
//! Boundary policy (matches categorical interval binning with `right=True`):
//! - bin 0 is closed on both sides: `[edge_0, edge_1]`
//! - every other bin is `(edge_k, edge_k+1]`
//!
//! A price equal to an interior edge therefore belongs to the bin whose upper
//! bound it is, and the global minimum lands in bin 0.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ProfileError;
use super::range::PriceRange;
use crate::domain::Observation;

/// Half-width ratio of the single bin built around a constant price.
pub const DEFAULT_EPSILON_RATIO: f64 = 0.001;

/// Largest accepted bin count.
pub const MAX_BIN_COUNT: usize = 1_000_000;

/// One price interval of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
}

impl Bin {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Contiguous equal-width bins described by their `bin_count + 1` edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    edges: Vec<f64>,
    degenerate: bool,
}

impl Partition {
    /// Partition `range` into `bin_count` equal-width bins.
    ///
    /// A zero-width range yields a single bin `[p - eps, p + eps]` with
    /// `eps = epsilon_ratio * |p|` (`epsilon_ratio` itself when `p == 0`),
    /// whatever `bin_count` was requested. Fails with `DegenerateRange` when
    /// that bin cannot be represented (non-positive ratio, or `p ± eps == p`).
    pub fn new(
        range: PriceRange,
        bin_count: usize,
        epsilon_ratio: f64,
    ) -> Result<Self, ProfileError> {
        if bin_count == 0 || bin_count > MAX_BIN_COUNT {
            return Err(ProfileError::InvalidBinCount(bin_count));
        }

        if range.is_degenerate() {
            return Self::degenerate(range.min, epsilon_ratio);
        }

        let span = range.span();
        let n = bin_count as f64;
        let mut edges: Vec<f64> = (0..=bin_count)
            .map(|i| range.min + span * (i as f64) / n)
            .collect();
        // Pin both ends so coverage is exact regardless of rounding.
        edges[0] = range.min;
        edges[bin_count] = range.max;

        Ok(Self {
            edges,
            degenerate: false,
        })
    }

    fn degenerate(price: f64, epsilon_ratio: f64) -> Result<Self, ProfileError> {
        let eps = if price == 0.0 {
            epsilon_ratio
        } else {
            epsilon_ratio * price.abs()
        };
        let lower = price - eps;
        let upper = price + eps;

        let representable =
            eps > 0.0 && lower.is_finite() && upper.is_finite() && lower < price && price < upper;
        if !representable {
            return Err(ProfileError::DegenerateRange { price });
        }

        Ok(Self {
            edges: vec![lower, upper],
            degenerate: true,
        })
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when built around a constant price.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn lower(&self) -> f64 {
        self.edges[0]
    }

    pub fn upper(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Nominal bin width (the last bin may differ by rounding).
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.upper() - self.lower()) / self.len() as f64
    }

    pub fn bin(&self, index: usize) -> Bin {
        Bin {
            lower: self.edges[index],
            upper: self.edges[index + 1],
        }
    }

    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        self.edges.windows(2).map(|w| Bin {
            lower: w[0],
            upper: w[1],
        })
    }

    /// True if `price` lies inside `[lower, upper]`.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower() && price <= self.upper()
    }

    /// Index of the bin holding `price`. Out-of-range prices (and NaN) are
    /// clamped into the nearest edge bin.
    pub fn locate(&self, price: f64) -> usize {
        let n = self.len();
        if n <= 1 || !(price > self.lower()) {
            return 0;
        }
        if price >= self.upper() {
            return n - 1;
        }

        let raw = ((price - self.lower()) / self.width()).ceil();
        let mut idx = (raw as usize).saturating_sub(1).min(n - 1);

        // The estimate can be off by one near an edge; settle against the stored edges.
        while idx > 0 && price <= self.edges[idx] {
            idx -= 1;
        }
        while idx < n - 1 && price > self.edges[idx + 1] {
            idx += 1;
        }
        idx
    }
}

/// Observations grouped by bin (indices into the input series).
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    members: Vec<Vec<usize>>,
    clamped: usize,
}

impl Assignment {
    pub fn bin_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Indices of the observations assigned to `bin`, in series order.
    pub fn members(&self, bin: usize) -> &[usize] {
        &self.members[bin]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.members.iter().map(Vec::as_slice)
    }

    /// Observations whose close fell outside the partition and was clamped.
    pub fn clamped(&self) -> usize {
        self.clamped
    }
}

/// Assign every observation to the bin containing its closing price.
pub fn assign_closes(partition: &Partition, observations: &[Observation]) -> Assignment {
    let mut members = vec![Vec::new(); partition.len()];
    let mut clamped = 0;

    for (i, obs) in observations.iter().enumerate() {
        if !partition.contains(obs.close) {
            clamped += 1;
        }
        if let Some(bucket) = members.get_mut(partition.locate(obs.close)) {
            bucket.push(i);
        }
    }

    if clamped > 0 {
        warn!(clamped, "closing prices outside the partition were clamped into edge bins");
    }

    Assignment { members, clamped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{close_only, obs};

    fn range(min: f64, max: f64) -> PriceRange {
        PriceRange { min, max }
    }

    #[test]
    fn equal_width_edges_cover_range_exactly() {
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.edges(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(p.width(), 1.0);
        assert!(!p.is_degenerate());
    }

    #[test]
    fn last_edge_pinned_to_max() {
        let p = Partition::new(range(0.1, 0.7), 3, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.lower(), 0.1);
        assert_eq!(p.upper(), 0.7);
        for w in p.edges().windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn zero_bin_count_rejected() {
        assert_eq!(
            Partition::new(range(1.0, 2.0), 0, DEFAULT_EPSILON_RATIO),
            Err(ProfileError::InvalidBinCount(0))
        );
    }

    #[test]
    fn oversized_bin_count_rejected() {
        assert_eq!(
            Partition::new(range(1.0, 2.0), usize::MAX, DEFAULT_EPSILON_RATIO),
            Err(ProfileError::InvalidBinCount(usize::MAX))
        );
        assert_eq!(
            Partition::new(range(1.0, 2.0), MAX_BIN_COUNT + 1, DEFAULT_EPSILON_RATIO),
            Err(ProfileError::InvalidBinCount(MAX_BIN_COUNT + 1))
        );
        assert!(Partition::new(range(1.0, 2.0), MAX_BIN_COUNT, DEFAULT_EPSILON_RATIO).is_ok());
    }

    #[test]
    fn minimum_lands_in_first_bin() {
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.locate(1.0), 0);
    }

    #[test]
    fn interior_edges_are_right_closed() {
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.locate(2.0), 0);
        assert_eq!(p.locate(2.000_001), 1);
        assert_eq!(p.locate(3.0), 1);
        assert_eq!(p.locate(4.0), 2);
        assert_eq!(p.locate(5.0), 3);
    }

    #[test]
    fn out_of_range_prices_clamp_to_edges() {
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.locate(0.5), 0);
        assert_eq!(p.locate(9.0), 3);
        assert_eq!(p.locate(f64::NAN), 0);
    }

    #[test]
    fn locate_agrees_with_stored_edges_for_awkward_widths() {
        let p = Partition::new(range(0.1, 0.4), 3, DEFAULT_EPSILON_RATIO).unwrap();
        for (k, bin) in p.bins().enumerate() {
            assert_eq!(p.locate(bin.upper), k, "upper edge of bin {k}");
            assert_eq!(p.locate(bin.midpoint()), k, "midpoint of bin {k}");
        }
    }

    #[test]
    fn degenerate_range_builds_single_epsilon_bin() {
        let p = Partition::new(range(10.0, 10.0), 70, DEFAULT_EPSILON_RATIO).unwrap();
        assert!(p.is_degenerate());
        assert_eq!(p.len(), 1);
        let bin = p.bin(0);
        assert!((bin.lower - 9.99).abs() < 1e-12);
        assert!((bin.upper - 10.01).abs() < 1e-12);
        assert!((bin.midpoint() - 10.0).abs() < 1e-12);
        assert_eq!(p.locate(10.0), 0);
    }

    #[test]
    fn degenerate_range_at_zero_uses_absolute_epsilon() {
        let p = Partition::new(range(0.0, 0.0), 1, DEFAULT_EPSILON_RATIO).unwrap();
        assert_eq!(p.bin(0).lower, -0.001);
        assert_eq!(p.bin(0).upper, 0.001);
    }

    #[test]
    fn degenerate_range_without_epsilon_fails() {
        assert_eq!(
            Partition::new(range(10.0, 10.0), 1, 0.0),
            Err(ProfileError::DegenerateRange { price: 10.0 })
        );
        // Ratio too small to move the price at all.
        assert_eq!(
            Partition::new(range(1e300, 1e300), 1, 1e-300),
            Err(ProfileError::DegenerateRange { price: 1e300 })
        );
    }

    #[test]
    fn assign_closes_groups_by_close_price() {
        let series = close_only(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0; 5]);
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        let a = assign_closes(&p, &series);
        assert_eq!(a.bin_count(), 4);
        assert_eq!(a.members(0), &[0, 1]);
        assert_eq!(a.members(1), &[2]);
        assert_eq!(a.members(2), &[3]);
        assert_eq!(a.members(3), &[4]);
        assert_eq!(a.clamped(), 0);
    }

    #[test]
    fn assign_ignores_high_and_low() {
        // Wide bar whose close sits in the top bin.
        let series = vec![obs(0, 1.0, 5.0, 1.0, 4.9, 7.0)];
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        let a = assign_closes(&p, &series);
        assert_eq!(a.members(3), &[0]);
        assert!(a.members(0).is_empty());
    }

    #[test]
    fn assign_counts_clamped_closes() {
        let series = close_only(&[0.5, 3.0, 6.0], &[1.0; 3]);
        let p = Partition::new(range(1.0, 5.0), 4, DEFAULT_EPSILON_RATIO).unwrap();
        let a = assign_closes(&p, &series);
        assert_eq!(a.clamped(), 2);
        assert_eq!(a.members(0), &[0]);
        assert_eq!(a.members(3), &[2]);
    }
}
