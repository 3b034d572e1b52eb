//! Error types for the ICTR pipeline

use thiserror::Error;

/// Reasons a single indicator is left out of the index.
///
/// These never abort a run: the normalizer absorbs them and the caller only
/// sees reduced coverage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Dropped {
    #[error("series has no observations")]
    Empty,

    #[error("series has no finite observations")]
    AllMissing,

    #[error("{months} resampled months cannot support a {lag}-month growth lag")]
    InsufficientHistory { months: usize, lag: usize },

    #[error("fetch failed: {0}")]
    FetchFailed(String),
}

/// Matrix-level failures of the index builder.
///
/// A missing index for lack of overlapping history is not an error; see
/// [`crate::builder::BuildOutcome::NoIndex`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("indicator '{indicator}' is degenerate after alignment (std dev {std_dev:e})")]
    DegenerateInput { indicator: String, std_dev: f64 },

    #[error("principal component decomposition failed: {0}")]
    Decomposition(String),
}

/// Errors surfaced by the I/O-facing APIs (input parsing, encoding)
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid period '{0}'")]
    PeriodParseError(String),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::schema::ValidationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
