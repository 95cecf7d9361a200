use polars::prelude::*;

use super::schema::ObservationSchema;

/// Ordering, de-duplication and sanity filtering of observation frames.
pub struct Canonicalizer;

impl Canonicalizer {
    /// Sort by timestamp and drop repeated timestamps, keeping the first row.
    pub fn canonicalize(df: LazyFrame) -> LazyFrame {
        df.sort(
            [ObservationSchema::TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(
            Some(vec![ObservationSchema::TIMESTAMP.into()]),
            UniqueKeepStrategy::First,
        )
    }

    /// Row predicate: positive prices, open and close within `[low, high]`,
    /// non-negative volume. Null fields fail it.
    pub fn sanity_expr() -> Expr {
        let positive = ["open", "high", "low", "close"]
            .into_iter()
            .map(|c| col(c).gt(lit(0.0)))
            .reduce(|acc, e| acc.and(e))
            .unwrap_or_else(|| lit(true));
        let within = |c: &str| col(c).gt_eq(col("low")).and(col(c).lt_eq(col("high")));

        positive
            .and(col("high").gt_eq(col("low")))
            .and(within("open"))
            .and(within("close"))
            .and(col(ObservationSchema::VOLUME).gt_eq(lit(0.0)))
    }

    /// Keep rows passing [`Canonicalizer::sanity_expr`].
    pub fn validate(df: LazyFrame) -> LazyFrame {
        df.filter(Self::sanity_expr())
    }

    /// Rows with zero volume; they still widen the price range.
    pub fn zero_volume_rows(df: &DataFrame) -> usize {
        df.column(ObservationSchema::VOLUME)
            .ok()
            .and_then(|c| c.f64().ok())
            .map(|v| v.iter().filter(|v| *v == Some(0.0)).count())
            .unwrap_or(0)
    }
}
