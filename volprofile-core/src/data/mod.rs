//! Market data: file ingest, synthetic series, and an in-memory cache.

pub mod cache;
pub mod canonicalize;
pub mod file_source;
pub mod ingest;
pub mod provider;
pub mod schema;
pub mod synthetic;

pub use cache::{CacheKey, CacheStats, CachedSource, ObservationCache};
pub use canonicalize::Canonicalizer;
pub use file_source::FileSource;
pub use ingest::{ingest_file, ingest_frame, parse_timestamp, IngestResult};
pub use provider::{within_period, DataError, MarketDataSource, SourceKind};
pub use schema::{ObservationSchema, SchemaError};
pub use synthetic::{generate_walk, SyntheticSource};
