//! Calendar alignment and completeness policy
//!
//! Growth series are outer-joined on their month-end dates into a sparse
//! matrix, then reduced to a rectangular matrix with no missing cells:
//! strict row completeness first, forward/backward fill as a fallback.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::GrowthSeries;

/// How the retained rows were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessStrategy {
    /// Only rows where every indicator was observed
    Strict,
    /// Rows completed by per-column forward then backward fill
    Filled,
}

impl CompletenessStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletenessStrategy::Strict => "strict",
            CompletenessStrategy::Filled => "filled",
        }
    }
}

/// Outer join of growth series; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Rectangular matrix with a defined value in every cell
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    /// Row-major values, one row per date
    pub rows: Vec<Vec<f64>>,
}

impl AlignedMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Values of one column in row order
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[col]).collect()
    }
}

/// Result of applying the completeness policy
#[derive(Debug, Clone, PartialEq)]
pub enum Completeness {
    Complete {
        matrix: AlignedMatrix,
        strategy: CompletenessStrategy,
        /// Rows in the outer join before any were dropped
        joined_rows: usize,
    },
    /// Neither strategy reached the row threshold
    Insufficient { rows: usize, required: usize },
}

/// Outer-join growth series on their dates; columns follow the map's key order
pub fn outer_join(series: &BTreeMap<String, GrowthSeries>) -> SparseMatrix {
    let dates: Vec<NaiveDate> = series
        .values()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns: Vec<String> = series.keys().cloned().collect();

    // Per-column lookup by date; point order inside a series does not matter.
    let by_date: Vec<BTreeMap<NaiveDate, f64>> = series
        .values()
        .map(|s| {
            s.points
                .iter()
                .filter(|p| p.value.is_finite())
                .map(|p| (p.date, p.value))
                .collect()
        })
        .collect();

    let cells = dates
        .iter()
        .map(|date| {
            by_date
                .iter()
                .map(|column| column.get(date).copied())
                .collect()
        })
        .collect();

    SparseMatrix {
        dates,
        columns,
        cells,
    }
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Remove rows where every column is missing
    pub fn without_empty_rows(&self) -> SparseMatrix {
        self.retain_rows(|row| row.iter().any(Option::is_some))
    }

    /// Keep only rows with a value in every column
    pub fn complete_rows(&self) -> AlignedMatrix {
        let complete = self.retain_rows(|row| row.iter().all(Option::is_some));
        AlignedMatrix {
            dates: complete.dates,
            columns: complete.columns,
            rows: complete
                .cells
                .into_iter()
                .map(|row| row.into_iter().flatten().collect())
                .collect(),
        }
    }

    /// Forward-fill then backward-fill each column independently
    pub fn filled(&self) -> SparseMatrix {
        let mut cells = self.cells.clone();

        for col in 0..self.columns.len() {
            let mut last = None;
            for row in cells.iter_mut() {
                match row[col] {
                    Some(v) => last = Some(v),
                    None => row[col] = last,
                }
            }

            let mut next = None;
            for row in cells.iter_mut().rev() {
                match row[col] {
                    Some(v) => next = Some(v),
                    None => row[col] = next,
                }
            }
        }

        SparseMatrix {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            cells,
        }
    }

    fn retain_rows(&self, keep: impl Fn(&[Option<f64>]) -> bool) -> SparseMatrix {
        let mut dates = Vec::new();
        let mut cells = Vec::new();
        for (date, row) in self.dates.iter().zip(&self.cells) {
            if keep(row) {
                dates.push(*date);
                cells.push(row.clone());
            }
        }
        SparseMatrix {
            dates,
            columns: self.columns.clone(),
            cells,
        }
    }
}

/// Reduce a sparse matrix to complete rows.
///
/// Strict completeness wins when it leaves at least `min_rows` rows;
/// otherwise forward/backward fill is tried under the same threshold.
pub fn apply_completeness_policy(sparse: &SparseMatrix, min_rows: usize) -> Completeness {
    let joined_rows = sparse.n_rows();
    let populated = sparse.without_empty_rows();

    let strict = populated.complete_rows();
    if strict.n_rows() >= min_rows {
        return Completeness::Complete {
            matrix: strict,
            strategy: CompletenessStrategy::Strict,
            joined_rows,
        };
    }

    let filled = populated.filled().complete_rows();
    if filled.n_rows() >= min_rows && filled.n_rows() > 0 {
        return Completeness::Complete {
            matrix: filled,
            strategy: CompletenessStrategy::Filled,
            joined_rows,
        };
    }

    Completeness::Insufficient {
        rows: strict.n_rows().max(filled.n_rows()),
        required: min_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::month_end_from_index;
    use crate::types::{GrowthPoint, GrowthTransform};
    use pretty_assertions::assert_eq;

    fn month(offset: i32) -> NaiveDate {
        month_end_from_index(2015 * 12 + offset).unwrap()
    }

    fn series(name: &str, start: i32, values: &[f64]) -> GrowthSeries {
        GrowthSeries {
            name: name.to_string(),
            transform: GrowthTransform::LogDifference,
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| GrowthPoint {
                    date: month(start + i as i32),
                    value: *v,
                })
                .collect(),
        }
    }

    fn map(items: Vec<GrowthSeries>) -> BTreeMap<String, GrowthSeries> {
        items.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    #[test]
    fn test_outer_join_unions_dates_and_sorts_columns() {
        let sparse = outer_join(&map(vec![
            series("b", 1, &[10.0, 11.0]),
            series("a", 0, &[1.0, 2.0]),
        ]));

        assert_eq!(sparse.columns, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sparse.dates, vec![month(0), month(1), month(2)]);
        assert_eq!(
            sparse.cells,
            vec![
                vec![Some(1.0), None],
                vec![Some(2.0), Some(10.0)],
                vec![None, Some(11.0)],
            ]
        );
    }

    #[test]
    fn test_non_finite_cells_become_missing() {
        let sparse = outer_join(&map(vec![series("a", 0, &[f64::NEG_INFINITY, 1.0])]));
        assert_eq!(sparse.cells, vec![vec![None], vec![Some(1.0)]]);
        assert_eq!(sparse.without_empty_rows().n_rows(), 1);
    }

    #[test]
    fn test_forward_then_backward_fill() {
        let sparse = SparseMatrix {
            dates: vec![month(0), month(1), month(2), month(3)],
            columns: vec!["a".to_string()],
            cells: vec![vec![None], vec![Some(2.0)], vec![None], vec![Some(4.0)]],
        };
        let filled = sparse.filled();
        assert_eq!(
            filled.cells,
            vec![vec![Some(2.0)], vec![Some(2.0)], vec![Some(2.0)], vec![Some(4.0)]]
        );
    }

    #[test]
    fn test_strict_policy_used_when_overlap_is_long_enough() {
        let a: Vec<f64> = (0..20).map(f64::from).collect();
        let b: Vec<f64> = (0..20).map(|i| f64::from(i) * 2.0).collect();
        let sparse = outer_join(&map(vec![series("a", 0, &a), series("b", 5, &b)]));

        match apply_completeness_policy(&sparse, 12) {
            Completeness::Complete {
                matrix,
                strategy,
                joined_rows,
            } => {
                assert_eq!(strategy, CompletenessStrategy::Strict);
                assert_eq!(joined_rows, 25);
                assert_eq!(matrix.n_rows(), 15);
                assert_eq!(matrix.dates[0], month(5));
                assert_eq!(matrix.rows[0], vec![5.0, 0.0]);
            }
            other => panic!("expected complete matrix, got {other:?}"),
        }
    }

    #[test]
    fn test_fill_fallback_when_strict_overlap_is_short() {
        let a: Vec<f64> = (0..10).map(f64::from).collect();
        let b: Vec<f64> = (0..10).map(f64::from).collect();
        // Overlap of 5 months, union of 15.
        let sparse = outer_join(&map(vec![series("a", 0, &a), series("b", 5, &b)]));

        match apply_completeness_policy(&sparse, 12) {
            Completeness::Complete {
                matrix, strategy, ..
            } => {
                assert_eq!(strategy, CompletenessStrategy::Filled);
                assert_eq!(matrix.n_rows(), 15);
                // "b" back-filled at the start, "a" forward-filled at the end.
                assert_eq!(matrix.rows[0], vec![0.0, 0.0]);
                assert_eq!(matrix.rows[14], vec![9.0, 9.0]);
            }
            other => panic!("expected filled matrix, got {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_when_union_is_shorter_than_threshold() {
        let sparse = outer_join(&map(vec![
            series("a", 0, &[1.0, 2.0, 3.0]),
            series("b", 0, &[1.0, 2.0, 3.0]),
        ]));
        assert_eq!(
            apply_completeness_policy(&sparse, 12),
            Completeness::Insufficient {
                rows: 3,
                required: 12
            }
        );
    }

    #[test]
    fn test_outer_join_does_not_depend_on_point_order() {
        let values: Vec<f64> = (0..14).map(f64::from).collect();
        let mut reversed = series("a", 0, &values);
        reversed.points.reverse();
        let sparse = outer_join(&map(vec![reversed, series("b", 0, &values)]));

        assert_eq!(sparse.n_rows(), 14);
        assert_eq!(sparse.cells[0], vec![Some(0.0), Some(0.0)]);
        assert_eq!(sparse.cells[13], vec![Some(13.0), Some(13.0)]);

        match apply_completeness_policy(&sparse, 12) {
            Completeness::Complete {
                matrix, strategy, ..
            } => {
                assert_eq!(strategy, CompletenessStrategy::Strict);
                assert_eq!(matrix.n_rows(), 14);
                assert_eq!(matrix.column(0), matrix.column(1));
            }
            other => panic!("expected complete matrix, got {other:?}"),
        }
    }
}
