//! Lookback period for a market data request.

use chrono::{Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback window counted back from the most recent observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Period::OneMonth => 1,
            Period::ThreeMonths => 3,
            Period::SixMonths => 6,
            Period::OneYear => 12,
            Period::TwoYears => 24,
        }
    }

    /// Earliest timestamp inside the window that ends at `end`.
    ///
    /// Saturates to `NaiveDateTime::MIN` for windows reaching before the
    /// representable calendar.
    pub fn window_start(&self, end: NaiveDateTime) -> NaiveDateTime {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDateTime::MIN)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period '{0}' (expected one of 1mo, 3mo, 6mo, 1y, 2y)")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePeriodError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_and_display_agree() {
        for p in Period::ALL {
            assert_eq!(p.to_string().parse::<Period>().unwrap(), p);
        }
        assert_eq!("1Y".parse::<Period>().unwrap(), Period::OneYear);
        assert!("5d".parse::<Period>().is_err());
    }

    #[test]
    fn default_is_six_months() {
        assert_eq!(Period::default(), Period::SixMonths);
    }

    #[test]
    fn window_start_counts_calendar_months() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let start = Period::OneMonth.window_start(end);
        // Feb has no 31st; chrono clamps to the last day of the month.
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let start = Period::TwoYears.window_start(end);
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2022, 3, 31).unwrap());
    }

    #[test]
    fn serde_uses_short_names() {
        let json = serde_json::to_string(&Period::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
        let back: Period = serde_json::from_str("\"2y\"").unwrap();
        assert_eq!(back, Period::TwoYears);
    }
}
