//! Series normalization
//!
//! This module turns one raw, irregularly dated indicator series into a
//! regular month-end year-over-year growth series:
//! - Resampling onto month ends (last observation within each month)
//! - Linear interpolation of interior month gaps
//! - Domain-dependent growth transform (log vs. level difference)
//!
//! Indicator-level failures are returned as [`Dropped`] and never abort the
//! wider pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{month_end_from_index, month_index};
use crate::error::Dropped;
use crate::types::{GrowthPoint, GrowthSeries, GrowthTransform, Observation, RawSeries};

/// Default growth lag in months (year-over-year on a monthly calendar)
pub const DEFAULT_LAG: usize = 12;

/// Normalizer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Number of months between a value and its growth reference
    pub lag: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { lag: DEFAULT_LAG }
    }
}

/// Growth series that survived normalization, plus the indicators that did not
#[derive(Debug, Clone, Default)]
pub struct NormalizedIndicators {
    pub series: BTreeMap<String, GrowthSeries>,
    pub dropped: Vec<(String, Dropped)>,
}

/// Normalizer for converting raw series to monthly growth series
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one raw series into a month-end growth series
    pub fn normalize(&self, raw: &RawSeries) -> Result<GrowthSeries, Dropped> {
        if raw.is_empty() {
            return Err(Dropped::Empty);
        }

        let lag = self.config.lag.max(1);
        let monthly = resample_monthly(&raw)?;
        let transform = choose_transform(&monthly);
        let points = growth_points(&monthly, lag, transform);

        if points.is_empty() {
            return Err(Dropped::InsufficientHistory {
                months: monthly.len(),
                lag,
            });
        }

        debug!(
            indicator = %raw.name,
            months = monthly.len(),
            growth_points = points.len(),
            transform = transform.as_str(),
            "normalized series"
        );

        Ok(GrowthSeries {
            name: raw.name.clone(),
            transform,
            points,
        })
    }

    /// Normalize every series of a mapping, absorbing per-indicator failures.
    ///
    /// Output series are named after their mapping key.
    pub fn normalize_all(&self, raw: &BTreeMap<String, RawSeries>) -> NormalizedIndicators {
        let mut out = NormalizedIndicators::default();

        for (name, series) in raw {
            match self.normalize(series) {
                Ok(mut growth) => {
                    growth.name = name.clone();
                    out.series.insert(name.clone(), growth);
                }
                Err(reason) => {
                    warn!(indicator = %name, %reason, "dropping indicator");
                    out.dropped.push((name.clone(), reason));
                }
            }
        }

        out
    }
}

/// Normalize one raw series with the default 12-month lag
pub fn normalize(raw: &RawSeries) -> Result<GrowthSeries, Dropped> {
    Normalizer::default().normalize(raw)
}

/// Resample onto a contiguous month-end calendar.
///
/// Each month takes its last finite observation; months in between with no
/// observation are linearly interpolated from their neighbours.
fn resample_monthly(raw: &RawSeries) -> Result<Vec<(NaiveDate, f64)>, Dropped> {
    let mut finite: Vec<Observation> = raw.finite_observations().copied().collect();

    // Stable: for equal dates the later-supplied observation stays last.
    finite.sort_by_key(|o| o.date);

    let (Some(first), Some(last)) = (finite.first(), finite.last()) else {
        return Err(Dropped::AllMissing);
    };

    let start = month_index(first.date);
    let span = (month_index(last.date) - start) as usize + 1;

    let mut slots: Vec<Option<f64>> = vec![None; span];
    for obs in &finite {
        slots[(month_index(obs.date) - start) as usize] = Some(obs.value);
    }

    interpolate_gaps(&mut slots);

    slots
        .into_iter()
        .enumerate()
        .map(|(offset, value)| {
            let date = month_end_from_index(start + offset as i32).ok_or(Dropped::AllMissing)?;
            let value = value.ok_or(Dropped::AllMissing)?;
            Ok((date, value))
        })
        .collect()
}

/// Fill interior gaps linearly by position; edges are never extrapolated
fn interpolate_gaps(slots: &mut [Option<f64>]) {
    let mut left: Option<(usize, f64)> = None;

    for idx in 0..slots.len() {
        let Some(value) = slots[idx] else {
            continue;
        };

        if let Some((left_idx, left_value)) = left {
            let width = (idx - left_idx) as f64;
            for gap in (left_idx + 1)..idx {
                let t = (gap - left_idx) as f64 / width;
                slots[gap] = Some(left_value + t * (value - left_value));
            }
        }

        left = Some((idx, value));
    }
}

/// Log growth only when the whole resampled series is strictly positive
fn choose_transform(monthly: &[(NaiveDate, f64)]) -> GrowthTransform {
    if monthly.iter().all(|(_, v)| *v > 0.0) {
        GrowthTransform::LogDifference
    } else {
        GrowthTransform::LevelDifference
    }
}

fn growth_points(
    monthly: &[(NaiveDate, f64)],
    lag: usize,
    transform: GrowthTransform,
) -> Vec<GrowthPoint> {
    monthly
        .iter()
        .enumerate()
        .skip(lag)
        .filter_map(|(t, &(date, current))| {
            let reference = monthly[t - lag].1;
            let value = match transform {
                GrowthTransform::LogDifference => current.ln() - reference.ln(),
                GrowthTransform::LevelDifference => current - reference,
            };
            value.is_finite().then_some(GrowthPoint { date, value })
        })
        .collect()
}
