use thiserror::Error;

/// Errors raised by the profile pipeline.
///
/// Displayable in CLI contexts; the caller decides how to phrase them for users.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("observation series is empty")]
    EmptySeries,

    #[error("price range collapses to {price} and no epsilon bin can be represented around it")]
    DegenerateRange { price: f64 },

    #[error("bin count must be within 1..=1000000, got {0}")]
    InvalidBinCount(usize),

    /// Binner produced no bins. Not reachable through the public pipeline.
    #[error("binner produced no bins (internal contract violation)")]
    EmptyProfile,
}
