//! Serializable analysis configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or none at
//! all) is valid. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::Period;
use crate::profile::{Attribution, ProfileOptions};

/// Accepted bin counts for interactive analysis.
pub const BIN_RANGE: RangeInclusive<usize> = 30..=150;

pub const DEFAULT_SYMBOL: &str = "TSLA";
pub const DEFAULT_BINS: usize = 70;
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("bins must be within {min}..={max}, got {got}")]
    BinsOutOfRange { got: usize, min: usize, max: usize },

    #[error("symbol must not be empty")]
    EmptySymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbol: String,
    pub period: Period,
    pub bins: usize,
    /// Directory holding `{SYMBOL}.csv` / `{SYMBOL}.parquet` files.
    pub data_dir: PathBuf,
    pub attribution: Attribution,
    /// Observation cache lifetime; entries never expire when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            period: Period::default(),
            bins: DEFAULT_BINS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            attribution: Attribution::default(),
            cache_ttl_secs: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        validate_bins(self.bins)
    }

    pub fn profile_options(&self) -> ProfileOptions {
        ProfileOptions::new(self.bins).with_attribution(self.attribution)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Check a bin count against [`BIN_RANGE`].
pub fn validate_bins(bins: usize) -> Result<(), ConfigError> {
    if BIN_RANGE.contains(&bins) {
        Ok(())
    } else {
        Err(ConfigError::BinsOutOfRange {
            got: bins,
            min: *BIN_RANGE.start(),
            max: *BIN_RANGE.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.symbol, "TSLA");
        assert_eq!(config.period, Period::SixMonths);
        assert_eq!(config.bins, 70);
        assert_eq!(config.attribution, Attribution::Close);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = AnalysisConfig::from_toml_str(
            r#"
symbol = "NVDA"
period = "1y"
bins = 100
attribution = "range"
cache_ttl_secs = 300
"#,
        )
        .unwrap();
        assert_eq!(config.symbol, "NVDA");
        assert_eq!(config.period, Period::OneYear);
        assert_eq!(config.bins, 100);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(300)));
        let opts = config.profile_options();
        assert_eq!(opts.bin_count, 100);
        assert_eq!(opts.attribution, Attribution::Range);
    }

    #[test]
    fn unknown_period_is_a_parse_error() {
        let err = AnalysisConfig::from_toml_str("period = \"5d\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bins_outside_range_rejected() {
        for bins in [0, 29, 151] {
            let config = AnalysisConfig {
                bins,
                ..AnalysisConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::BinsOutOfRange { got, .. }) if got == bins
            ));
        }
        assert!(validate_bins(30).is_ok());
        assert!(validate_bins(150).is_ok());
    }

    #[test]
    fn blank_symbol_rejected() {
        let config = AnalysisConfig {
            symbol: "  ".into(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptySymbol)));
    }

    #[test]
    fn toml_round_trip() {
        let config = AnalysisConfig {
            symbol: "SPY".into(),
            period: Period::TwoYears,
            cache_ttl_secs: Some(60),
            ..AnalysisConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(AnalysisConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volprofile.toml");
        std::fs::write(&path, "symbol = \"AAPL\"\nbins = 45\n").unwrap();
        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.bins, 45);

        let missing = AnalysisConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
