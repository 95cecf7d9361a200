//! Synthetic market data for demos, tests and benchmarks.
//!
//! Produces a simple random walk from a starting price of 100.0 over
//! weekdays. The walk is seeded from the BLAKE3 hash of the symbol, so a
//! symbol always yields the same series for the same end date.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, MarketDataSource};
use crate::domain::{Observation, Period};

pub struct SyntheticSource {
    end: NaiveDate,
}

impl SyntheticSource {
    /// Series end on `end` (inclusive).
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    /// Series end today (local time).
    pub fn ending_today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<Observation>, DataError> {
        let end = self.end.and_hms_opt(0, 0, 0).ok_or_else(|| {
            DataError::ValidationError(format!("invalid synthetic end date {}", self.end))
        })?;
        let start = period.window_start(end).date();
        let observations = generate_walk(&symbol.to_uppercase(), start, self.end);
        if observations.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                period,
            });
        }
        Ok(observations)
    }
}

/// Weekday random walk between `start` and `end` inclusive.
pub fn generate_walk(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut observations = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        if let Some(timestamp) = current.and_hms_opt(0, 0, 0) {
            observations.push(Observation {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        price = close;
        current += chrono::Duration::days(1);
    }

    observations
}
