//! Standardization and single-factor extraction
//!
//! The composite index is the first principal component of the standardized
//! aligned matrix. The decomposition is an SVD of the z-scored matrix
//! (`X = U S Vᵀ`):
//!
//! ```text
//! scores   = X v₁
//! ratio    = s₁² / Σ sᵢ²
//! ```
//!
//! SVD leaves the sign of `v₁` arbitrary, so [`orient`] fixes it against the
//! equal-weight mean of the standardized inputs.

use nalgebra::{DMatrix, DVector};

use crate::align::AlignedMatrix;
use crate::error::BuildError;

/// Z-scored matrix plus the moments used to produce it
#[derive(Debug, Clone)]
pub struct Standardized {
    pub matrix: DMatrix<f64>,
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

/// First principal component of a standardized matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FirstComponent {
    /// Per-row projection on the component
    pub scores: Vec<f64>,
    /// Per-column weight of the component (unit norm)
    pub loadings: Vec<f64>,
    pub explained_variance_ratio: f64,
}

/// Standardize every column to zero mean and unit variance.
///
/// Uses the population standard deviation over the retained rows. A column
/// whose standard deviation is below `epsilon` (or not finite) is reported
/// instead of producing infinities.
pub fn standardize(aligned: &AlignedMatrix, epsilon: f64) -> Result<Standardized, BuildError> {
    let n_rows = aligned.n_rows();
    let n_cols = aligned.n_cols();
    let n = n_rows as f64;

    let mut means = Vec::with_capacity(n_cols);
    let mut std_devs = Vec::with_capacity(n_cols);

    for col in 0..n_cols {
        let values = aligned.column(col);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if !std_dev.is_finite() || std_dev < epsilon {
            return Err(BuildError::DegenerateInput {
                indicator: aligned.columns[col].clone(),
                std_dev,
            });
        }

        means.push(mean);
        std_devs.push(std_dev);
    }

    let matrix = DMatrix::from_fn(n_rows, n_cols, |r, c| {
        (aligned.rows[r][c] - means[c]) / std_devs[c]
    });

    Ok(Standardized {
        matrix,
        means,
        std_devs,
    })
}

/// Extract the dominant component via SVD
pub fn first_component(x: &DMatrix<f64>) -> Result<FirstComponent, BuildError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(BuildError::Decomposition(format!(
            "cannot decompose a {}x{} matrix",
            x.nrows(),
            x.ncols()
        )));
    }

    let svd = x.clone().svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| BuildError::Decomposition("right singular vectors unavailable".into()))?;

    let total: f64 = svd.singular_values.iter().map(|s| s * s).sum();
    let (idx, s1) = svd
        .singular_values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| BuildError::Decomposition("no singular values".into()))?;

    if !(total.is_finite() && total > 0.0) {
        return Err(BuildError::Decomposition(format!(
            "total variance is {total}"
        )));
    }

    let loadings: Vec<f64> = v_t.row(idx).iter().copied().collect();
    let scores = x * DVector::from_column_slice(&loadings);

    Ok(FirstComponent {
        scores: scores.iter().copied().collect(),
        loadings,
        explained_variance_ratio: (s1 * s1 / total).clamp(0.0, 1.0),
    })
}

/// Row-wise mean across columns (equal-weight composite)
pub fn row_means(x: &DMatrix<f64>) -> Vec<f64> {
    let n_cols = x.ncols() as f64;
    x.row_iter().map(|row| row.sum() / n_cols).collect()
}

/// Pearson correlation; `None` when either side has no variance
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 && denom.is_finite() {
        Some(cov / denom)
    } else {
        None
    }
}

/// Flip the component when it correlates negatively with `reference`.
///
/// Returns whether the sign was flipped. An undefined correlation keeps the
/// decomposition's sign.
pub fn orient(component: &mut FirstComponent, reference: &[f64]) -> bool {
    match pearson(reference, &component.scores) {
        Some(corr) if corr < 0.0 => {
            component.scores.iter_mut().for_each(|s| *s = -*s);
            component.loadings.iter_mut().for_each(|l| *l = -*l);
            true
        }
        _ => false,
    }
}
