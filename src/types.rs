//! Core types for the ICTR pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw indicator series, monthly growth series, and the composite
//! index series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single dated observation of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Raw value in the indicator's own unit; non-finite means missing
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Raw series for one named indicator, as supplied by a fetcher.
///
/// Dates may be irregular (annual, quarterly, monthly or mixed) and need not
/// be sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    /// Indicator name (the key in the index builder)
    pub name: String,
    pub observations: Vec<Observation>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Build a series from `(date, value)` pairs
    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self::new(
            name,
            pairs
                .into_iter()
                .map(|(date, value)| Observation::new(date, value))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations with a finite value, in supplied order
    pub fn finite_observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(|o| o.value.is_finite())
    }
}

/// Growth transform chosen for a series from its value domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTransform {
    /// `ln(v[t]) - ln(v[t - lag])`, used when every value is strictly positive
    LogDifference,
    /// `v[t] - v[t - lag]`, used when any value is zero or negative
    LevelDifference,
}

impl GrowthTransform {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthTransform::LogDifference => "log_difference",
            GrowthTransform::LevelDifference => "level_difference",
        }
    }
}

/// One month-end growth value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    /// Last calendar day of the month
    pub date: NaiveDate,
    pub value: f64,
}

/// Year-over-year growth series on a month-end calendar.
///
/// Points built by the normalizer are sorted by date, unique and finite.
/// Months may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    pub name: String,
    pub transform: GrowthTransform,
    pub points: Vec<GrowthPoint>,
}

impl GrowthSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Growth value at a month-end date
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|p| p.date == date)
            .map(|p| p.value)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

/// One value of the composite index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    /// Published index value (`score * scale + base`)
    pub value: f64,
    /// Oriented first-component score the value was derived from
    pub score: f64,
}

/// Composite index series with its quality score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndex {
    /// Points in ascending date order
    pub points: Vec<IndexPoint>,
    /// Share of standardized-input variance captured by the first component (0-1)
    pub explained_variance_ratio: f64,
    /// Indicators that entered the decomposition, in column order
    pub indicators: Vec<String>,
    pub base: f64,
    pub scale: f64,
}

impl CompositeIndex {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.score).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn latest(&self) -> Option<&IndexPoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_series_lookup() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let series = GrowthSeries {
            name: "CPI".to_string(),
            transform: GrowthTransform::LogDifference,
            points: vec![
                GrowthPoint { date: d1, value: 0.03 },
                GrowthPoint { date: d2, value: 0.02 },
            ],
        };

        assert_eq!(series.get(d2), Some(0.02));
        assert_eq!(series.get(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), None);
        assert_eq!(series.first_date(), Some(d1));
        assert_eq!(series.last_date(), Some(d2));
    }

    #[test]
    fn test_transform_serializes_snake_case() {
        let json = serde_json::to_string(&GrowthTransform::LevelDifference).unwrap();
        assert_eq!(json, "\"level_difference\"");
        assert_eq!(GrowthTransform::LogDifference.as_str(), "log_difference");
    }
}
