//! Profile export: JSON, CSV levels table, and a content fingerprint.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use super::aggregate::VolumeProfile;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct LevelRow {
    lower_bound: f64,
    upper_bound: f64,
    midpoint: f64,
    volume: f64,
    is_poc: bool,
}

impl VolumeProfile {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the levels table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for level in &self.levels {
            wtr.serialize(LevelRow {
                lower_bound: level.lower_bound,
                upper_bound: level.upper_bound,
                midpoint: level.midpoint,
                volume: level.accumulated_volume,
                is_poc: level.is_poc,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// BLAKE3 over the bit patterns of every level and summary scalar.
    ///
    /// Two profiles share a fingerprint only if they are bit-identical.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for level in &self.levels {
            hasher.update(&level.lower_bound.to_bits().to_le_bytes());
            hasher.update(&level.upper_bound.to_bits().to_le_bytes());
            hasher.update(&level.midpoint.to_bits().to_le_bytes());
            hasher.update(&level.accumulated_volume.to_bits().to_le_bytes());
            hasher.update(&[u8::from(level.is_poc)]);
        }
        hasher.update(&(self.poc_index as u64).to_le_bytes());
        for scalar in [
            self.poc_price,
            self.poc_volume,
            self.total_volume,
            self.current_price,
            self.price_min,
            self.price_max,
            self.bin_width,
        ] {
            hasher.update(&scalar.to_bits().to_le_bytes());
        }
        hasher.update(&(self.observation_count as u64).to_le_bytes());
        hasher.update(self.attribution.as_str().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
