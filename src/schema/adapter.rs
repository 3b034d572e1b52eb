//! Adapter for converting ictr.raw_series.v1 documents to raw series
//!
//! Parses period labels into dates, drops missing values, averages duplicate
//! dates and applies an optional history cutoff. Per-indicator problems
//! (a fetcher-reported failure, an unparseable period) become fetch failures
//! so the pipeline can drop that indicator and carry on.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::ComputeError;
use crate::schema::raw_series::*;
use crate::sources::{FetchFailed, FetchOutcome};
use crate::types::RawSeries;

/// Conversion options applied to every indicator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningOptions {
    /// Discard observations dated before this day
    pub since: Option<NaiveDate>,
}

/// Adapter for converting input documents to raw series
pub struct RawSeriesAdapter;

impl RawSeriesAdapter {
    /// Parse a JSON string containing a whole document
    pub fn parse_document(json: &str) -> Result<RawSeriesDocument, ComputeError> {
        let document: RawSeriesDocument = serde_json::from_str(json)?;
        Ok(document)
    }

    /// Parse NDJSON (newline-delimited JSON), one indicator record per line
    pub fn parse_ndjson(ndjson: &str) -> Result<RawSeriesDocument, ComputeError> {
        let mut indicators = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<IndicatorRecord>(trimmed) {
                Ok(record) => indicators.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(RawSeriesDocument::new(indicators))
    }

    /// Convert a document to one fetch outcome per indicator.
    ///
    /// The document structure must be valid (version, unique names); anything
    /// wrong with a single record only fails that record.
    pub fn to_raw_series(
        document: &RawSeriesDocument,
        options: &CleaningOptions,
    ) -> Result<BTreeMap<String, FetchOutcome>, ComputeError> {
        document.validate()?;

        Ok(document
            .indicators
            .iter()
            .map(|record| (record.name.clone(), Self::convert_record(record, options)))
            .collect())
    }

    /// Validate the document and each record, returning only the failures
    pub fn validate_records(document: &RawSeriesDocument) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        if let Err(error) = document.validate() {
            results.push(ValidationResult {
                index: None,
                indicator: None,
                error,
            });
        }

        results.extend(
            document
                .indicators
                .iter()
                .enumerate()
                .filter_map(|(idx, record)| {
                    record.validate().err().map(|error| ValidationResult {
                        index: Some(idx),
                        indicator: Some(record.name.clone()),
                        error,
                    })
                }),
        );

        results
    }

    fn convert_record(record: &IndicatorRecord, options: &CleaningOptions) -> FetchOutcome {
        if let Some(reason) = &record.fetch_error {
            return Err(FetchFailed::new(reason.clone()));
        }

        // Duplicate dates are averaged.
        let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for obs in &record.observations {
            let date = parse_period(&obs.period)
                .map_err(|e| FetchFailed::new(format!("{}: {}", record.name, e)))?;

            let Some(value) = obs.value.filter(|v| v.is_finite()) else {
                continue;
            };
            if options.since.is_some_and(|since| date < since) {
                continue;
            }

            let entry = by_date.entry(date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        debug!(
            indicator = %record.name,
            observations = record.observations.len(),
            kept = by_date.len(),
            "converted indicator record"
        );

        Ok(RawSeries::from_pairs(
            record.name.clone(),
            by_date
                .into_iter()
                .map(|(date, (sum, count))| (date, sum / count as f64)),
        ))
    }
}

/// Parse a published period label into a date.
///
/// Quarters map to the first day of the quarter's last month (`2024-Q1` →
/// 2024-03-01), months to their first day, bare years to January 1st.
/// Anything else is read as an ISO date, `YYYY-MM`, an ISO datetime, or
/// epoch milliseconds.
pub fn parse_period(period: &str) -> Result<NaiveDate, ComputeError> {
    let trimmed = period.trim();
    let upper = trimmed.to_ascii_uppercase();
    let invalid = || ComputeError::PeriodParseError(period.to_string());

    if let Some((year, quarter)) = upper.split_once('Q') {
        let year: i32 = year.trim_end_matches('-').parse().map_err(|_| invalid())?;
        let quarter: u32 = quarter.parse().map_err(|_| invalid())?;
        if !(1..=4).contains(&quarter) {
            return Err(invalid());
        }
        return NaiveDate::from_ymd_opt(year, quarter * 3, 1).ok_or_else(invalid);
    }

    if let Some((year, month)) = upper.split_once('M') {
        let year: i32 = year.trim_end_matches('-').parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid);
    }

    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if trimmed.len() == 4 {
            let year: i32 = trimmed.parse().map_err(|_| invalid())?;
            return NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid);
        }
        if trimmed.len() >= 9 {
            let millis: i64 = trimmed.parse().map_err(|_| invalid())?;
            return DateTime::<Utc>::from_timestamp_millis(millis)
                .map(|dt| dt.date_naive())
                .ok_or_else(invalid);
        }
        return Err(invalid());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"))
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|_| invalid())
}

/// A failed validation check
#[derive(Debug)]
pub struct ValidationResult {
    /// Record position, `None` for document-level failures
    pub index: Option<usize>,
    pub indicator: Option<String>,
    pub error: ValidationError,
}
