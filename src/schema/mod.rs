//! Versioned ictr.raw_series.v1 input schema
//!
//! This module defines the batch input document accepted by the CLI and the
//! adapter that turns it into raw series for the pipeline.

mod adapter;
mod raw_series;

pub use adapter::*;
pub use raw_series::*;
