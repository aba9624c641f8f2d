//! Region × region correlation matrices ("covariance connectomes").
//!
//! A connectome is computed across subjects: each region is a variable, each
//! subject an observation. Matrices built from the same region set share
//! label order, so two groups' matrices can be combined element-wise.

use super::rank::rank_columns;
use crate::constants::MIN_SUBJECTS;
use crate::data::WideTable;
use crate::error::{Error, Result};
use crate::types::{CorrelationMethod, CovarianceMatrix, LabeledMatrix, Matrix};

/// Compute the region × region correlation matrix of a subject × region table.
///
/// # Arguments
///
/// * `table` - Subjects as rows, regions as columns
/// * `method` - Pearson, Spearman or Kendall
///
/// # Returns
///
/// A symmetric matrix labelled by region on both axes. The diagonal is
/// exactly 1 for regions with non-zero variance. A constant region has NaN
/// on its whole row and column: the correlation is undefined, which is
/// reported as NaN rather than an error.
///
/// # Errors
///
/// [`Error::InsufficientData`] if the table has fewer than two subjects.
///
/// The computation is pure: identical input gives a bit-identical matrix.
pub fn compute_covariance(table: &WideTable, method: CorrelationMethod) -> Result<CovarianceMatrix> {
    let n = table.n_subjects();
    if n < MIN_SUBJECTS {
        return Err(Error::InsufficientData {
            context: "correlation input".to_string(),
            subjects: n,
        });
    }

    let values = match method {
        CorrelationMethod::Pearson => pearson_matrix(table.values()),
        CorrelationMethod::Spearman => pearson_matrix(&rank_columns(table.values())),
        CorrelationMethod::Kendall => kendall_matrix(table.values()),
    };

    LabeledMatrix::new(table.regions().to_vec(), table.regions().to_vec(), values)
}

/// Pearson correlation between the columns of `data`.
fn pearson_matrix(data: &Matrix) -> Matrix {
    let p = data.ncols();
    let varies: Vec<bool> = data.column_iter().map(|c| !is_constant(c.as_slice())).collect();

    let mut centered = data.clone();
    for mut column in centered.column_iter_mut() {
        let mean = column.mean();
        column.add_scalar_mut(-mean);
    }
    let sum_sq: Vec<f64> = centered.column_iter().map(|c| c.norm_squared()).collect();

    let mut out = Matrix::from_element(p, p, f64::NAN);
    for i in 0..p {
        if varies[i] && sum_sq[i] > 0.0 {
            out[(i, i)] = 1.0;
        }
        for j in (i + 1)..p {
            if !(varies[i] && varies[j]) {
                continue;
            }
            let denom = (sum_sq[i] * sum_sq[j]).sqrt();
            let r = centered.column(i).dot(&centered.column(j)) / denom;
            // NaN survives clamp
            let r = r.clamp(-1.0, 1.0);
            out[(i, j)] = r;
            out[(j, i)] = r;
        }
    }
    out
}

/// Kendall tau-b between the columns of `data`.
fn kendall_matrix(data: &Matrix) -> Matrix {
    let p = data.ncols();
    let mut out = Matrix::from_element(p, p, f64::NAN);

    for i in 0..p {
        let x = data.column(i);
        if is_constant(x.as_slice()) || x.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[(i, i)] = 1.0;
        for j in (i + 1)..p {
            let tau = kendall_tau_b(x.as_slice(), data.column(j).as_slice());
            out[(i, j)] = tau;
            out[(j, i)] = tau;
        }
    }
    out
}

/// Kendall's tau-b with tie correction.
///
/// ```text
/// tau_b = (C - D) / sqrt((n0 - Tx) (n0 - Ty))
/// ```
///
/// where `n0 = n(n-1)/2`, and `Tx`, `Ty` count pairs tied in x and in y.
/// Returns NaN when either variable is constant or contains NaN.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return f64::NAN;
    }

    let n = x.len();
    let mut concordant = 0_i64;
    let mut discordant = 0_i64;
    let mut ties_x = 0_i64;
    let mut ties_y = 0_i64;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                ties_x += 1;
            }
            if dy == 0.0 {
                ties_y += 1;
            }
            if dx != 0.0 && dy != 0.0 {
                if (dx > 0.0) == (dy > 0.0) {
                    concordant += 1;
                } else {
                    discordant += 1;
                }
            }
        }
    }

    let n0 = (n * n.saturating_sub(1) / 2) as i64;
    let denom = (((n0 - ties_x) * (n0 - ties_y)) as f64).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    ((concordant - discordant) as f64 / denom).clamp(-1.0, 1.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
