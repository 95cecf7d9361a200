//! Volprofile Core: volume-at-price profiles and their point of control.
//!
//! This crate contains:
//! - Domain types (observations, lookback periods)
//! - The profile pipeline: price range, equal-width binning, per-bin volume
//!   aggregation and point-of-control selection
//! - Profile export (JSON, CSV) and a content fingerprint
//! - Market data sources (CSV/Parquet files, synthetic walks) behind a
//!   keyed in-memory cache
//! - TOML analysis configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod profile;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AnalysisConfig, ConfigError};
pub use data::{CachedSource, DataError, FileSource, MarketDataSource, ObservationCache, SyntheticSource};
pub use domain::{Observation, Period};
pub use profile::{
    compute_volume_profile, compute_volume_profile_with, Attribution, ProfileError, ProfileLevel,
    ProfileOptions, VolumeProfile,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public data and source types are Send + Sync,
    /// so profiles can be computed on worker threads over a shared cache.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Observation>();
        require_sync::<domain::Observation>();
        require_send::<domain::Period>();
        require_sync::<domain::Period>();

        // Profile types
        require_send::<profile::VolumeProfile>();
        require_sync::<profile::VolumeProfile>();
        require_send::<profile::ProfileLevel>();
        require_sync::<profile::ProfileLevel>();
        require_send::<profile::Partition>();
        require_sync::<profile::Partition>();
        require_send::<profile::ProfileOptions>();
        require_sync::<profile::ProfileOptions>();

        // Data sources and cache
        require_send::<data::FileSource>();
        require_sync::<data::FileSource>();
        require_send::<data::SyntheticSource>();
        require_sync::<data::SyntheticSource>();
        require_send::<data::ObservationCache>();
        require_sync::<data::ObservationCache>();
        require_send::<data::CachedSource<data::FileSource>>();
        require_sync::<data::CachedSource<data::FileSource>>();

        // Config
        require_send::<config::AnalysisConfig>();
        require_sync::<config::AnalysisConfig>();
    }

    /// Profile computation takes observations only; it never sees a data
    /// source, so every source yields the same profile for the same series.
    #[test]
    fn profile_is_independent_of_source() {
        let source = SyntheticSource::new(chrono::NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
        let cached = CachedSource::new(
            SyntheticSource::new(source.end()),
            ObservationCache::new(),
        );
        let direct = source.fetch("TSLA", Period::ThreeMonths).unwrap();
        let shared = cached.observations("TSLA", Period::ThreeMonths).unwrap();

        let a = compute_volume_profile(&direct, 70).unwrap();
        let b = compute_volume_profile(&shared, 70).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
