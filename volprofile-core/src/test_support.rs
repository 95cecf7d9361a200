//! Fixtures shared by unit tests.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::Observation;

pub(crate) fn ts(day: i64) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    base + chrono::Duration::days(day)
}

pub(crate) fn obs(day: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Observation {
    Observation {
        timestamp: ts(day),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// One flat bar per close (open = high = low = close).
pub(crate) fn close_only(closes: &[f64], volumes: &[f64]) -> Vec<Observation> {
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&c, &v))| obs(i as i64, c, c, c, c, v))
        .collect()
}
