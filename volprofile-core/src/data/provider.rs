//! Market data source trait and structured error types.
//!
//! The MarketDataSource trait abstracts over where observations come from
//! (local CSV/Parquet files, synthetic data) so callers can swap
//! implementations and mock for tests. Caching sits above this trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Observation, Period};

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("ingest failed: {0}")]
    IngestFailed(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("no observations for '{symbol}' in period {period}")]
    NoData { symbol: String, period: Period },
}

/// On-disk format of an observation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    CsvFile,
    ParquetFile,
}

/// Supplier of chronologically ordered observations.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Observations for `symbol` covering `period`, ordered by timestamp ascending.
    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<Observation>, DataError>;
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<Observation>, DataError> {
        (**self).fetch(symbol, period)
    }
}

/// Keep the observations within `period` of the most recent one.
pub fn within_period(mut observations: Vec<Observation>, period: Period) -> Vec<Observation> {
    let Some(end) = observations.last().map(|o| o.timestamp) else {
        return observations;
    };
    let start = period.window_start(end);
    observations.retain(|o| o.timestamp >= start);
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::close_only;

    #[test]
    fn within_period_counts_back_from_last_observation() {
        // 120 consecutive days starting 2024-01-02.
        let series = close_only(&[1.0; 120], &[1.0; 120]);
        let last = series.last().unwrap().timestamp;
        let kept = within_period(series, Period::OneMonth);
        assert_eq!(kept.last().unwrap().timestamp, last);
        assert!(kept.first().unwrap().timestamp >= Period::OneMonth.window_start(last));
        assert!(kept.len() >= 28 && kept.len() <= 32);
    }

    #[test]
    fn within_period_keeps_short_series_whole() {
        let series = close_only(&[1.0; 10], &[1.0; 10]);
        assert_eq!(within_period(series, Period::TwoYears).len(), 10);
    }

    #[test]
    fn within_period_on_empty_series() {
        assert!(within_period(Vec::new(), Period::OneYear).is_empty());
    }
}
