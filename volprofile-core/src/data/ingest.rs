//! File ingest: CSV / Parquet → validated, chronological observations.
//!
//! Pipeline: read → normalize headers → cast → sort + dedupe → sanity filter
//! → parse timestamps. Rows failing the sanity filter are dropped and counted.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

use super::canonicalize::Canonicalizer;
use super::provider::{DataError, SourceKind};
use super::schema::{ObservationSchema, SchemaError};
use crate::domain::Observation;

impl From<SchemaError> for DataError {
    fn from(e: SchemaError) -> Self {
        DataError::ValidationError(e.to_string())
    }
}

/// Output of the ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub observations: Vec<Observation>,
    pub source: SourceKind,
    /// Rows removed by the sanity filter.
    pub dropped_rows: usize,
    pub zero_volume_rows: usize,
}

/// Format of an observation file, decided by extension.
pub fn source_kind(path: &Path) -> Option<SourceKind> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => Some(SourceKind::CsvFile),
        Some("parquet") => Some(SourceKind::ParquetFile),
        _ => None,
    }
}

/// Ingest a CSV or Parquet observation file.
pub fn ingest_file(path: &Path) -> Result<IngestResult, DataError> {
    let Some(kind) = source_kind(path) else {
        return Err(DataError::IngestFailed(format!(
            "unsupported file type: {}",
            path.display()
        )));
    };
    let lazy = match kind {
        SourceKind::CsvFile => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .map_err(|e| DataError::IngestFailed(format!("read csv {}: {e}", path.display())))?,
        SourceKind::ParquetFile => LazyFrame::scan_parquet(path, Default::default())
            .map_err(|e| {
                DataError::IngestFailed(format!("read parquet {}: {e}", path.display()))
            })?,
    };

    let mut df = lazy
        .collect()
        .map_err(|e| DataError::IngestFailed(format!("collect {}: {e}", path.display())))?;
    debug!(path = %path.display(), rows = df.height(), "read observation file");

    ingest_frame(&mut df, kind)
}

/// Ingest a frame with observation columns (any header case) read from a
/// `source` file.
pub fn ingest_frame(df: &mut DataFrame, source: SourceKind) -> Result<IngestResult, DataError> {
    ObservationSchema::normalize(df)?;

    let canonical = Canonicalizer::canonicalize(
        df.clone().lazy().select(ObservationSchema::cast_exprs()),
    )
    .collect()
    .map_err(|e| DataError::ValidationError(format!("canonicalize: {e}")))?;
    let deduped_rows = canonical.height();

    let clean = Canonicalizer::validate(canonical.lazy())
        .collect()
        .map_err(|e| DataError::ValidationError(format!("sanity filter: {e}")))?;
    let zero_volume_rows = Canonicalizer::zero_volume_rows(&clean);
    let mut observations = frame_to_observations(&clean)?;

    // The frame filter passes infinities; the per-row check does not.
    observations.retain(Observation::is_sane);
    let dropped_rows = deduped_rows - observations.len();
    if dropped_rows > 0 {
        warn!(dropped_rows, "dropped rows failing OHLCV sanity checks");
    }

    // String order equals time order only for ISO timestamps; settle it on the parsed values.
    observations.sort_by_key(|o| o.timestamp);
    observations.dedup_by_key(|o| o.timestamp);

    Ok(IngestResult {
        observations,
        source,
        dropped_rows,
        zero_volume_rows,
    })
}

/// Convert a cast, canonical frame into observations.
fn frame_to_observations(df: &DataFrame) -> Result<Vec<Observation>, DataError> {
    let column_err = |name: &str, e: PolarsError| {
        DataError::ValidationError(format!("{name} column: {e}"))
    };

    let dates = df
        .column("date")
        .and_then(|c| c.str())
        .map_err(|e| column_err("date", e))?;
    let opens = df
        .column("open")
        .and_then(|c| c.f64())
        .map_err(|e| column_err("open", e))?;
    let highs = df
        .column("high")
        .and_then(|c| c.f64())
        .map_err(|e| column_err("high", e))?;
    let lows = df
        .column("low")
        .and_then(|c| c.f64())
        .map_err(|e| column_err("low", e))?;
    let closes = df
        .column("close")
        .and_then(|c| c.f64())
        .map_err(|e| column_err("close", e))?;
    let volumes = df
        .column("volume")
        .and_then(|c| c.f64())
        .map_err(|e| column_err("volume", e))?;

    let mut observations = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw = dates
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null date at row {i}")))?;
        observations.push(Observation {
            timestamp: parse_timestamp(raw)?,
            open: opens.get(i).unwrap_or(f64::NAN),
            high: highs.get(i).unwrap_or(f64::NAN),
            low: lows.get(i).unwrap_or(f64::NAN),
            close: closes.get(i).unwrap_or(f64::NAN),
            volume: volumes.get(i).unwrap_or(0.0),
        });
    }
    Ok(observations)
}

/// Parse a date or date-time string. Offsets are dropped (local wall time kept).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DataError> {
    let s = raw.trim();

    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(ts.naive_local());
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DataError::ValidationError(format!("unparseable timestamp '{raw}'")))
}
