//! Composite index construction
//!
//! Fuses a mapping of growth series into one index:
//! align → complete → standardize → first component → orient → rescale.
//!
//! Not having enough overlapping history is a normal outcome
//! ([`BuildOutcome::NoIndex`]); a flat-lined indicator is an error
//! ([`BuildError::DegenerateInput`]) the caller should surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::align::{
    apply_completeness_policy, outer_join, AlignedMatrix, Completeness, CompletenessStrategy,
};
use crate::error::BuildError;
use crate::factor::{first_component, orient, row_means, standardize};
use crate::types::{CompositeIndex, GrowthSeries, IndexPoint};

/// Default index level of a zero score
pub const DEFAULT_BASE: f64 = 100.0;

/// Default index points per unit of score
pub const DEFAULT_SCALE: f64 = 10.0;

/// Default minimum number of aligned months
pub const DEFAULT_MIN_ROWS: usize = 12;

/// Default standard deviation below which a column is degenerate
pub const DEFAULT_DEGENERATE_STD_EPSILON: f64 = 1e-10;

/// Builder settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub base: f64,
    pub scale: f64,
    pub min_rows: usize,
    pub degenerate_std_epsilon: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            scale: DEFAULT_SCALE,
            min_rows: DEFAULT_MIN_ROWS,
            degenerate_std_epsilon: DEFAULT_DEGENERATE_STD_EPSILON,
        }
    }
}

/// Why no index could be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoIndexReason {
    /// The growth-series mapping was empty
    NoIndicators,
    /// Too few aligned months after both completeness strategies
    InsufficientOverlap { rows: usize, required: usize },
}

impl std::fmt::Display for NoIndexReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoIndexReason::NoIndicators => write!(f, "no indicators available"),
            NoIndexReason::InsufficientOverlap { rows, required } => write!(
                f,
                "only {rows} aligned months available, {required} required"
            ),
        }
    }
}

/// Per-column figures from standardization and decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiagnostics {
    pub indicator: String,
    pub mean: f64,
    pub std_dev: f64,
    /// Oriented first-component weight
    pub loading: f64,
}

/// How the index was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDiagnostics {
    pub strategy: CompletenessStrategy,
    /// Months in the outer join of all growth series
    pub joined_rows: usize,
    /// Months that entered the decomposition
    pub retained_rows: usize,
    /// Whether the orientation rule negated the decomposition's sign
    pub sign_flipped: bool,
    pub columns: Vec<ColumnDiagnostics>,
}

/// Successful build: the index and how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltIndex {
    pub index: CompositeIndex,
    pub diagnostics: BuildDiagnostics,
}

/// Result of a build that did not fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Index(BuiltIndex),
    NoIndex(NoIndexReason),
}

impl BuildOutcome {
    pub fn index(&self) -> Option<&CompositeIndex> {
        match self {
            BuildOutcome::Index(built) => Some(&built.index),
            BuildOutcome::NoIndex(_) => None,
        }
    }

    pub fn explained_variance_ratio(&self) -> Option<f64> {
        self.index().map(|i| i.explained_variance_ratio)
    }

    pub fn is_no_index(&self) -> bool {
        matches!(self, BuildOutcome::NoIndex(_))
    }
}

/// Builder for the composite index
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeIndexBuilder {
    config: IndexConfig,
}

impl CompositeIndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build the index from a mapping of growth series
    pub fn build(
        &self,
        series: &BTreeMap<String, GrowthSeries>,
    ) -> Result<BuildOutcome, BuildError> {
        if series.is_empty() {
            return Ok(BuildOutcome::NoIndex(NoIndexReason::NoIndicators));
        }

        let sparse = outer_join(series);
        match apply_completeness_policy(&sparse, self.config.min_rows) {
            Completeness::Complete {
                matrix,
                strategy,
                joined_rows,
            } => {
                if strategy == CompletenessStrategy::Filled {
                    warn!(
                        joined_rows,
                        retained_rows = matrix.n_rows(),
                        "strict overlap too short, using forward/backward fill"
                    );
                }
                self.build_from_matrix(&matrix, strategy, joined_rows)
                    .map(BuildOutcome::Index)
            }
            Completeness::Insufficient { rows, required } => {
                debug!(rows, required, "no index: insufficient overlap");
                Ok(BuildOutcome::NoIndex(NoIndexReason::InsufficientOverlap {
                    rows,
                    required,
                }))
            }
        }
    }

    /// Build without the named indicators, e.g. after a degenerate-input error
    pub fn build_excluding(
        &self,
        series: &BTreeMap<String, GrowthSeries>,
        excluded: &[&str],
    ) -> Result<BuildOutcome, BuildError> {
        let kept: BTreeMap<String, GrowthSeries> = series
            .iter()
            .filter(|(name, _)| !excluded.contains(&name.as_str()))
            .map(|(name, s)| (name.clone(), s.clone()))
            .collect();
        self.build(&kept)
    }

    fn build_from_matrix(
        &self,
        matrix: &AlignedMatrix,
        strategy: CompletenessStrategy,
        joined_rows: usize,
    ) -> Result<BuiltIndex, BuildError> {
        let standardized = standardize(matrix, self.config.degenerate_std_epsilon)?;
        let mut component = first_component(&standardized.matrix)?;

        let equal_weight = row_means(&standardized.matrix);
        let sign_flipped = orient(&mut component, &equal_weight);

        let points = matrix
            .dates
            .iter()
            .zip(&component.scores)
            .map(|(date, score)| IndexPoint {
                date: *date,
                value: score * self.config.scale + self.config.base,
                score: *score,
            })
            .collect();

        let columns = matrix
            .columns
            .iter()
            .enumerate()
            .map(|(c, name)| ColumnDiagnostics {
                indicator: name.clone(),
                mean: standardized.means[c],
                std_dev: standardized.std_devs[c],
                loading: component.loadings[c],
            })
            .collect();

        debug!(
            strategy = strategy.as_str(),
            rows = matrix.n_rows(),
            indicators = matrix.n_cols(),
            explained_variance = component.explained_variance_ratio,
            sign_flipped,
            "built composite index"
        );

        Ok(BuiltIndex {
            index: CompositeIndex {
                points,
                explained_variance_ratio: component.explained_variance_ratio,
                indicators: matrix.columns.clone(),
                base: self.config.base,
                scale: self.config.scale,
            },
            diagnostics: BuildDiagnostics {
                strategy,
                joined_rows,
                retained_rows: matrix.n_rows(),
                sign_flipped,
                columns,
            },
        })
    }
}

/// Build the index with the default base 100 / scale 10 configuration
pub fn build_index(series: &BTreeMap<String, GrowthSeries>) -> Result<BuildOutcome, BuildError> {
    CompositeIndexBuilder::default().build(series)
}
