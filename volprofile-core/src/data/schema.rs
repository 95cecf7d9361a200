use polars::prelude::*;

/// Canonical column layout for observation files.
pub struct ObservationSchema;

impl ObservationSchema {
    pub const TIMESTAMP: &'static str = "date";
    pub const PRICE_COLUMNS: [&'static str; 4] = ["open", "high", "low", "close"];
    pub const VOLUME: &'static str = "volume";

    /// Header aliases accepted for the timestamp column.
    const TIMESTAMP_ALIASES: [&'static str; 3] = ["date", "datetime", "timestamp"];

    /// Target dtypes after ingest casting.
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(Self::TIMESTAMP.into(), DataType::String),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new(Self::VOLUME.into(), DataType::Float64),
        ])
    }

    /// Lowercase headers and map timestamp aliases onto `date`.
    ///
    /// Provider exports use `Date,Open,High,Low,Close,Adj Close,Volume`;
    /// intraday exports often say `Datetime` or `timestamp`.
    pub fn normalize(df: &mut DataFrame) -> Result<(), SchemaError> {
        let lowered: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();
        df.set_column_names(lowered)
            .map_err(|e| SchemaError::Rename(e.to_string()))?;

        if !Self::has_column(df, Self::TIMESTAMP) {
            let alias = Self::TIMESTAMP_ALIASES
                .iter()
                .find(|alias| Self::has_column(df, alias))
                .ok_or_else(|| SchemaError::MissingColumn(Self::TIMESTAMP.to_string()))?;
            df.rename(alias, Self::TIMESTAMP.into())
                .map_err(|e| SchemaError::Rename(e.to_string()))?;
        }

        Self::validate(df)
    }

    /// Check all required columns exist.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        for field in Self::schema().iter_fields() {
            if !Self::has_column(df, field.name()) {
                return Err(SchemaError::MissingColumn(field.name().to_string()));
            }
        }
        Ok(())
    }

    fn has_column(df: &DataFrame, name: &str) -> bool {
        df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    /// Projection casting every required column to its target dtype.
    pub fn cast_exprs() -> Vec<Expr> {
        Self::schema()
            .iter_fields()
            .map(|field| col(field.name().clone()).cast(field.dtype().clone()))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column rename failed: {0}")]
    Rename(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_style_frame() -> DataFrame {
        df!(
            "Date" => &["2024-01-02", "2024-01-03"],
            "Open" => &[100.0, 101.0],
            "High" => &[102.0, 103.0],
            "Low" => &[99.0, 100.0],
            "Close" => &[101.0, 102.0],
            "Adj Close" => &[101.0, 102.0],
            "Volume" => &[1000i64, 1100],
        )
        .unwrap()
    }

    #[test]
    fn schema_has_all_required_columns() {
        let schema = ObservationSchema::schema();
        for name in ["date", "open", "high", "low", "close", "volume"] {
            assert!(schema.contains(name), "missing {name}");
        }
    }

    #[test]
    fn normalize_lowercases_provider_headers() {
        let mut df = provider_style_frame();
        ObservationSchema::normalize(&mut df).unwrap();
        assert!(df.column("close").is_ok());
        assert!(df.column("adj close").is_ok());
    }

    #[test]
    fn normalize_maps_timestamp_alias() {
        let mut df = provider_style_frame();
        df.rename("Date", "Datetime".into()).unwrap();
        ObservationSchema::normalize(&mut df).unwrap();
        assert!(df.column("date").is_ok());
    }

    #[test]
    fn normalize_rejects_missing_volume() {
        let mut df = provider_style_frame();
        let _ = df.drop_in_place("Volume").unwrap();
        let err = ObservationSchema::normalize(&mut df).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "volume"));
    }
}
