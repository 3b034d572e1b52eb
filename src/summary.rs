//! Dashboard figures derived from a composite index
//!
//! Headline numbers shown next to the index: the latest reading, its change
//! against the previous month, the direction of travel, the historical range
//! and a reliability percentage taken from the explained variance. Also
//! "Base 100" rebasing for comparing series that live on different scales.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::CompositeIndex;

/// Direction of the latest move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Unchanged,
}

impl Trend {
    fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            Some(d) if d > 0.0 => Trend::Improving,
            Some(d) if d < 0.0 => Trend::Worsening,
            _ => Trend::Unchanged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Worsening => "worsening",
            Trend::Unchanged => "unchanged",
        }
    }
}

/// Headline figures for one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub latest_date: NaiveDate,
    pub latest: f64,
    /// Value one period before the latest, if any
    pub previous: Option<f64>,
    pub delta: Option<f64>,
    pub trend: Trend,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Explained variance as a percentage (0-100)
    pub reliability_pct: f64,
    pub periods: usize,
}

impl IndexSummary {
    /// Summarize an index; `None` when it has no points
    pub fn from_index(index: &CompositeIndex) -> Option<Self> {
        let latest = index.latest()?;
        let values = index.values();

        let previous = values.len().checked_sub(2).map(|i| values[i]);
        let delta = previous.map(|p| latest.value - p);

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Some(Self {
            latest_date: latest.date,
            latest: latest.value,
            previous,
            delta,
            trend: Trend::from_delta(delta),
            min,
            max,
            mean,
            reliability_pct: index.explained_variance_ratio * 100.0,
            periods: values.len(),
        })
    }
}

/// Rebase a series so its first value is 100.
///
/// Returns `None` for an empty series or one whose first value is zero or
/// not finite.
pub fn rebase_to_100(series: &[(NaiveDate, f64)]) -> Option<Vec<(NaiveDate, f64)>> {
    let &(_, first) = series.first()?;
    if first == 0.0 || !first.is_finite() {
        return None;
    }

    Some(
        series
            .iter()
            .map(|&(date, value)| (date, value / first * 100.0))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexPoint;
    use pretty_assertions::assert_eq;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1)
            .unwrap()
            .checked_add_months(chrono::Months::new(1))
            .unwrap()
            .pred_opt()
            .unwrap()
    }

    fn index(values: &[f64], evr: f64) -> CompositeIndex {
        CompositeIndex {
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| IndexPoint {
                    date: date(i as u32 + 1),
                    value: *v,
                    score: (v - 100.0) / 10.0,
                })
                .collect(),
            explained_variance_ratio: evr,
            indicators: vec!["GDP".to_string(), "IPI".to_string()],
            base: 100.0,
            scale: 10.0,
        }
    }

    #[test]
    fn test_summary_figures() {
        let summary = IndexSummary::from_index(&index(&[98.0, 104.0, 101.0, 103.5], 0.62)).unwrap();

        assert_eq!(summary.latest_date, date(4));
        assert_eq!(summary.latest, 103.5);
        assert_eq!(summary.previous, Some(101.0));
        assert_eq!(summary.delta, Some(2.5));
        assert_eq!(summary.trend, Trend::Improving);
        assert_eq!(summary.min, 98.0);
        assert_eq!(summary.max, 104.0);
        assert_eq!(summary.mean, 101.625);
        assert!((summary.reliability_pct - 62.0).abs() < 1e-9);
        assert_eq!(summary.periods, 4);
    }

    #[test]
    fn test_trend_direction() {
        let falling = IndexSummary::from_index(&index(&[101.0, 99.0], 0.5)).unwrap();
        assert_eq!(falling.trend, Trend::Worsening);

        let flat = IndexSummary::from_index(&index(&[100.0, 100.0], 0.5)).unwrap();
        assert_eq!(flat.trend, Trend::Unchanged);
        assert_eq!(flat.trend.as_str(), "unchanged");
    }

    #[test]
    fn test_single_point_has_no_delta() {
        let summary = IndexSummary::from_index(&index(&[97.0], 0.9)).unwrap();
        assert_eq!(summary.previous, None);
        assert_eq!(summary.delta, None);
        assert_eq!(summary.trend, Trend::Unchanged);
    }

    #[test]
    fn test_empty_index_has_no_summary() {
        assert!(IndexSummary::from_index(&index(&[], 0.0)).is_none());
    }

    #[test]
    fn test_rebase_to_100() {
        let series = vec![(date(1), 80.0), (date(2), 100.0), (date(3), 60.0)];
        assert_eq!(
            rebase_to_100(&series).unwrap(),
            vec![(date(1), 100.0), (date(2), 125.0), (date(3), 75.0)]
        );

        assert_eq!(rebase_to_100(&[]), None);
        assert_eq!(rebase_to_100(&[(date(1), 0.0), (date(2), 1.0)]), None);
    }
}
