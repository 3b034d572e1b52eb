//! ictr.raw_series.v1 schema definition
//!
//! The batch input format: one record per indicator, carrying its source
//! descriptor and the observations exactly as the statistical agency
//! published them (period labels, possibly missing values).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::adapter::parse_period;
use crate::sources::IndicatorSource;

/// Current schema version
pub const SCHEMA_VERSION: &str = "ictr.raw_series.v1";

/// One published observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Period label: `2024-Q1`, `2024Q1`, `2024-M01`, `2024M01`, `2024`,
    /// an ISO date/datetime, or epoch milliseconds
    pub period: String,
    /// Missing values are kept in the document and discarded on conversion
    #[serde(default)]
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(period: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

/// One indicator as delivered by a fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// Indicator name, unique within a document
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IndicatorSource>,
    /// Unit label, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Set by the fetcher when the series could not be retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    #[serde(default)]
    pub observations: Vec<RawObservation>,
}

impl IndicatorRecord {
    pub fn new(name: impl Into<String>, observations: Vec<RawObservation>) -> Self {
        Self {
            name: name.into(),
            source: None,
            unit: None,
            fetch_error: None,
            observations,
        }
    }

    /// Record for an indicator whose fetch failed
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fetch_error: Some(reason.into()),
            ..Self::new(name, Vec::new())
        }
    }

    pub fn with_source(mut self, source: IndicatorSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate the record on its own: a name and parseable periods
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if let Some(bad) = self
            .observations
            .iter()
            .find(|obs| parse_period(&obs.period).is_err())
        {
            return Err(ValidationError::InvalidPeriod {
                indicator: self.name.clone(),
                period: bad.period.clone(),
            });
        }

        Ok(())
    }
}

/// A batch of indicator records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesDocument {
    pub schema_version: String,
    pub indicators: Vec<IndicatorRecord>,
}

impl RawSeriesDocument {
    pub fn new(indicators: Vec<IndicatorRecord>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            indicators,
        }
    }

    /// Validate the document structure.
    ///
    /// Checks the schema version, that every record is named, and that names
    /// are unique. Period labels are checked per record by
    /// [`IndicatorRecord::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for record in &self.indicators {
            if record.name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(record.name.as_str()) {
                return Err(ValidationError::DuplicateIndicator(record.name.clone()));
            }
        }

        Ok(())
    }
}

/// Validation errors for input documents
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Indicator name must not be empty")]
    EmptyName,

    #[error("Indicator '{0}' appears more than once")]
    DuplicateIndicator(String),

    #[error("Indicator '{indicator}' has an unparseable period '{period}'")]
    InvalidPeriod { indicator: String, period: String },
}
