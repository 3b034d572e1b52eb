//! ICTR - Composite economic index from heterogeneous indicator series
//!
//! Turns raw economic indicator series (quarterly, monthly, irregular; different
//! units) into a single monthly composite index through a deterministic
//! pipeline: monthly resampling → year-over-year growth → calendar alignment →
//! standardization → first principal component → rescale to `score × 10 + 100`.
//!
//! ## Modules
//!
//! - **Core pipeline**: [`normalizer`], [`align`], [`factor`], [`builder`], [`pipeline`]
//! - **Input/output**: [`schema`] (ictr.raw_series.v1), [`encoder`] (ictr.snapshot.v1)
//! - **Collaborator contracts**: [`sources`], [`cache`]
//! - **Presentation**: [`summary`]

pub mod align;
pub mod builder;
pub mod cache;
pub mod calendar;
pub mod encoder;
pub mod error;
pub mod factor;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod sources;
pub mod summary;
pub mod types;

pub use builder::{build_index, BuildOutcome, CompositeIndexBuilder, IndexConfig, NoIndexReason};
pub use encoder::{IctrEncoder, IctrPayload};
pub use error::{BuildError, ComputeError, Dropped};
pub use normalizer::{normalize, Normalizer, NormalizerConfig};
pub use pipeline::{compute_ictr, compute_ictr_from_fetches, IctrProcessor, IctrReport, PipelineConfig};
pub use sources::{FetchFailed, FetchOutcome, IndicatorSource, SourceSystem};
pub use summary::{rebase_to_100, IndexSummary, Trend};
pub use types::{CompositeIndex, GrowthSeries, RawSeries};

// Schema exports
pub use schema::{RawSeriesAdapter, RawSeriesDocument, SCHEMA_VERSION};

/// Crate version embedded in all snapshot payloads
pub const ICTR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshot payloads
pub const PRODUCER_NAME: &str = "ictr";
