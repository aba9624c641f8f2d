//! Built-in group comparison statistics.
//!
//! Graph statistics read a covariance matrix as a weighted undirected graph:
//! every non-zero entry is an edge, a non-zero diagonal entry is a self-loop.

use std::collections::VecDeque;
use std::sync::Arc;

use super::Statistic;
use crate::error::Result;
use crate::types::{CovarianceMatrix, LabeledMatrix, Matrix};

/// Element-wise difference `a - b` (regions × regions).
pub fn correlation_matrix_difference(a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
    a.ensure_aligned(b)?;
    Ok(a.with_values(a.values() - b.values()))
}

/// Frobenius norm of `a - b` (1 × 1).
pub fn frobenius_norm_difference(a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
    a.ensure_aligned(b)?;
    let norm = (a.values() - b.values()).norm();
    Ok(LabeledMatrix::scalar("frobenius", "norm", norm))
}

/// Difference in weighted node degree (regions × 1).
pub fn degree_difference(a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
    a.ensure_aligned(b)?;
    let da = weighted_degree(a.values());
    let db = weighted_degree(b.values());
    node_column(a, "degree_diff", da.iter().zip(&db).map(|(x, y)| x - y))
}

/// Difference in node strength, the row sum of absolute weights (regions × 1).
pub fn strength_difference(a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
    a.ensure_aligned(b)?;
    let strength = |m: &Matrix| -> Vec<f64> { m.row_iter().map(|r| r.abs().sum()).collect() };
    let (sa, sb) = (strength(a.values()), strength(b.values()));
    node_column(a, "strength_diff", sa.iter().zip(&sb).map(|(x, y)| x - y))
}

/// Difference in global efficiency (1 × 1).
pub fn global_efficiency_difference(a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
    a.ensure_aligned(b)?;
    let diff = global_efficiency(a.values()) - global_efficiency(b.values());
    Ok(LabeledMatrix::scalar("global_efficiency", "global_efficiency_diff", diff))
}

/// Weighted degree of every node.
///
/// Sum of incident edge weights, where a self-loop contributes its weight
/// twice (it touches the node at both ends).
pub fn weighted_degree(m: &Matrix) -> Vec<f64> {
    (0..m.nrows())
        .map(|i| {
            let incident: f64 = (0..m.ncols()).filter(|&j| j != i).map(|j| m[(i, j)]).sum();
            incident + 2.0 * m[(i, i)]
        })
        .collect()
}

/// Unweighted global efficiency.
///
/// Mean of `1 / d(i, j)` over ordered pairs of distinct nodes, with `d` the
/// hop distance in the graph of non-zero off-diagonal entries. Unreachable
/// pairs contribute 0. Graphs with fewer than two nodes have efficiency 0.
pub fn global_efficiency(m: &Matrix) -> f64 {
    let n = m.nrows();
    if n < 2 {
        return 0.0;
    }

    let adjacency: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && (m[(i, j)] != 0.0 || m[(j, i)] != 0.0))
                .collect()
        })
        .collect();

    let mut total = 0.0;
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::with_capacity(n);
    for source in 0..n {
        dist.fill(usize::MAX);
        dist[source] = 0;
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &v in &adjacency[u] {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    total += 1.0 / dist[v] as f64;
                    queue.push_back(v);
                }
            }
        }
    }

    total / (n * (n - 1)) as f64
}

fn node_column(
    like: &CovarianceMatrix,
    column: &str,
    values: impl Iterator<Item = f64>,
) -> Result<LabeledMatrix> {
    let values: Vec<f64> = values.collect();
    LabeledMatrix::new(
        like.row_labels().to_vec(),
        vec![column.to_string()],
        Matrix::from_vec(values.len(), 1, values),
    )
}

macro_rules! builtin_statistic {
    ($ty:ident, $name:literal, $func:ident, |$n:ident| $shape:expr) => {
        struct $ty;

        impl Statistic for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn compute(&self, a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
                $func(a, b)
            }

            fn output_shape(&self, $n: usize) -> Option<(usize, usize)> {
                Some($shape)
            }
        }
    };
}

builtin_statistic!(Difference, "correlation_matrix_difference", correlation_matrix_difference, |n| (n, n));
builtin_statistic!(Frobenius, "frobenius_norm_difference", frobenius_norm_difference, |_n| (1, 1));
builtin_statistic!(Degree, "degree_difference", degree_difference, |n| (n, 1));
builtin_statistic!(Strength, "strength_difference", strength_difference, |n| (n, 1));
builtin_statistic!(Efficiency, "global_efficiency_difference", global_efficiency_difference, |_n| (1, 1));

pub(super) fn all() -> Vec<Arc<dyn Statistic>> {
    vec![
        Arc::new(Difference),
        Arc::new(Frobenius),
        Arc::new(Degree),
        Arc::new(Strength),
        Arc::new(Efficiency),
    ]
}
