//! Domain types for volume profile analysis

pub mod observation;
pub mod period;

pub use observation::{is_chronological, Observation};
pub use period::{ParsePeriodError, Period};

