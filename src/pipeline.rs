//! Pipeline orchestration
//!
//! This module provides the public one-call API of the crate. It runs the
//! full pipeline from raw indicator series to a composite index report:
//! normalization → alignment → standardization → factor extraction → rescale.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::{BuildOutcome, CompositeIndexBuilder, IndexConfig};
use crate::error::{BuildError, ComputeError, Dropped};
use crate::normalizer::{NormalizedIndicators, Normalizer, NormalizerConfig};
use crate::schema::{CleaningOptions, RawSeriesAdapter, RawSeriesDocument};
use crate::sources::FetchOutcome;
use crate::types::{CompositeIndex, GrowthSeries, GrowthTransform, RawSeries};

/// Settings for a whole pipeline run, loadable from JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub index: IndexConfig,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What happened to one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndicatorStatus {
    Included {
        transform: GrowthTransform,
        growth_points: usize,
        first_date: Option<NaiveDate>,
        last_date: Option<NaiveDate>,
    },
    Dropped {
        reason: String,
    },
}

/// Per-indicator line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDiagnostics {
    pub indicator: String,
    #[serde(flatten)]
    pub status: IndicatorStatus,
}

impl IndicatorDiagnostics {
    fn included(name: &str, growth: &GrowthSeries) -> Self {
        Self {
            indicator: name.to_string(),
            status: IndicatorStatus::Included {
                transform: growth.transform,
                growth_points: growth.len(),
                first_date: growth.first_date(),
                last_date: growth.last_date(),
            },
        }
    }

    fn dropped(name: &str, reason: &Dropped) -> Self {
        Self {
            indicator: name.to_string(),
            status: IndicatorStatus::Dropped {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_included(&self) -> bool {
        matches!(self.status, IndicatorStatus::Included { .. })
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct IctrReport {
    pub outcome: BuildOutcome,
    /// One line per supplied indicator, ordered by name
    pub indicators: Vec<IndicatorDiagnostics>,
    /// Indicators left out before the index was built
    pub dropped: Vec<(String, Dropped)>,
}

impl IctrReport {
    pub fn index(&self) -> Option<&CompositeIndex> {
        self.outcome.index()
    }

    pub fn explained_variance_ratio(&self) -> Option<f64> {
        self.outcome.explained_variance_ratio()
    }

    pub fn is_no_index(&self) -> bool {
        self.outcome.is_no_index()
    }

    /// Number of indicators the caller supplied
    pub fn indicators_supplied(&self) -> usize {
        self.indicators.len()
    }

    /// Number of indicators that reached the index builder
    pub fn indicators_used(&self) -> usize {
        self.indicators.iter().filter(|d| d.is_included()).count()
    }
}

/// Convert a mapping of raw series into a composite index report with the
/// default configuration (12-month lag, base 100, scale 10).
///
/// # Example
/// ```ignore
/// let report = compute_ictr(&raw)?;
/// if let Some(index) = report.index() {
///     println!("latest ICTR: {:?}", index.latest());
/// }
/// ```
pub fn compute_ictr(raw: &BTreeMap<String, RawSeries>) -> Result<IctrReport, BuildError> {
    IctrProcessor::default().process(raw)
}

/// Same as [`compute_ictr`], for fetcher results that may have failed.
///
/// Each failed fetch is reported as [`Dropped::FetchFailed`].
pub fn compute_ictr_from_fetches(
    fetches: &BTreeMap<String, FetchOutcome>,
) -> Result<IctrReport, BuildError> {
    IctrProcessor::default().process_fetches(fetches)
}

/// Pipeline with explicit settings.
///
/// Holds no state between runs; identical inputs give identical reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct IctrProcessor {
    normalizer: Normalizer,
    builder: CompositeIndexBuilder,
}

impl IctrProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.normalizer),
            builder: CompositeIndexBuilder::new(config.index),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn builder(&self) -> &CompositeIndexBuilder {
        &self.builder
    }

    /// Run the pipeline on successfully fetched series
    pub fn process(&self, raw: &BTreeMap<String, RawSeries>) -> Result<IctrReport, BuildError> {
        let normalized = self.normalizer.normalize_all(raw);
        self.finish(normalized)
    }

    /// Run the pipeline on fetch outcomes, dropping failed fetches
    pub fn process_fetches(
        &self,
        fetches: &BTreeMap<String, FetchOutcome>,
    ) -> Result<IctrReport, BuildError> {
        let mut fetched = BTreeMap::new();
        let mut failed = Vec::new();

        for (name, outcome) in fetches {
            match outcome {
                Ok(series) => {
                    fetched.insert(name.clone(), series.clone());
                }
                Err(failure) => {
                    debug!(indicator = %name, reason = %failure, "fetch failed upstream");
                    failed.push((name.clone(), Dropped::from(failure.clone())));
                }
            }
        }

        let mut normalized = self.normalizer.normalize_all(&fetched);
        normalized.dropped.extend(failed);
        self.finish(normalized)
    }

    /// Run the pipeline on an input document
    pub fn process_document(
        &self,
        document: &RawSeriesDocument,
        options: &CleaningOptions,
    ) -> Result<IctrReport, ComputeError> {
        let fetches = RawSeriesAdapter::to_raw_series(document, options)?;
        Ok(self.process_fetches(&fetches)?)
    }

    fn finish(&self, normalized: NormalizedIndicators) -> Result<IctrReport, BuildError> {
        let NormalizedIndicators { series, mut dropped } = normalized;
        dropped.sort_by(|a, b| a.0.cmp(&b.0));

        let mut lines: BTreeMap<&str, IndicatorDiagnostics> = series
            .iter()
            .map(|(name, growth)| (name.as_str(), IndicatorDiagnostics::included(name, growth)))
            .collect();
        for (name, reason) in &dropped {
            lines.insert(name.as_str(), IndicatorDiagnostics::dropped(name, reason));
        }
        let indicators: Vec<IndicatorDiagnostics> = lines.into_values().collect();

        let outcome = self.builder.build(&series)?;

        match &outcome {
            BuildOutcome::Index(built) => info!(
                indicators = built.index.indicators.len(),
                dropped = dropped.len(),
                months = built.index.len(),
                explained_variance = built.index.explained_variance_ratio,
                "ICTR computed"
            ),
            BuildOutcome::NoIndex(reason) => info!(
                dropped = dropped.len(),
                %reason,
                "no ICTR computed"
            ),
        }

        Ok(IctrReport {
            outcome,
            indicators,
            dropped,
        })
    }
}
