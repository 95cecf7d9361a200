//! Local-file market data source.
//!
//! Layout: `{data_dir}/{SYMBOL}.csv` or `{data_dir}/{SYMBOL}.parquet`
//! (the symbol as given is also tried, for lowercase file names).

use std::path::{Path, PathBuf};
use tracing::info;

use super::ingest::ingest_file;
use super::provider::{within_period, DataError, MarketDataSource};
use crate::domain::{Observation, Period};

pub struct FileSource {
    data_dir: PathBuf,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the data files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// First existing file for `symbol`, CSV before Parquet.
    pub fn resolve(&self, symbol: &str) -> Option<PathBuf> {
        let upper = symbol.to_uppercase();
        let stems = if upper == symbol {
            vec![upper]
        } else {
            vec![upper, symbol.to_string()]
        };

        stems
            .iter()
            .flat_map(|stem| {
                ["csv", "parquet"]
                    .into_iter()
                    .map(move |ext| self.data_dir.join(format!("{stem}.{ext}")))
            })
            .find(|path| path.is_file())
    }
}

impl MarketDataSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<Observation>, DataError> {
        let path = self
            .resolve(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let ingested = ingest_file(&path)?;
        let total = ingested.observations.len();
        let observations = within_period(ingested.observations, period);
        info!(
            symbol,
            period = %period,
            path = %path.display(),
            loaded = total,
            kept = observations.len(),
            dropped = ingested.dropped_rows,
            "loaded observations from file"
        );

        if observations.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                period,
            });
        }
        Ok(observations)
    }
}
