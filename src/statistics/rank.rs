//! Rank transforms for rank-based correlation.

use crate::types::Matrix;

/// Compute 1-based average ranks of `data`.
///
/// Tied values share the mean of the ranks they span, e.g. `[10, 20, 20, 30]`
/// ranks as `[1, 2.5, 2.5, 4]`.
///
/// # Arguments
///
/// * `data` - Values to rank, in any order
///
/// # Returns
///
/// A vector aligned with `data` holding each value's rank. If `data`
/// contains NaN every rank is NaN, so the NaN propagates into the
/// correlation instead of being silently ordered.
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if data.iter().any(|v| v.is_nan()) {
        return vec![f64::NAN; n];
    }

    // Sort indices once, then walk runs of equal values
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && data[order[end]] == data[order[start]] {
            end += 1;
        }

        // Positions start..end hold ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }

    ranks
}

/// Replace every column of `data` by its average ranks.
pub fn rank_columns(data: &Matrix) -> Matrix {
    let mut ranked = data.clone();
    for mut column in ranked.column_iter_mut() {
        let ranks = average_ranks(column.as_slice());
        column.copy_from_slice(&ranks);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_values() {
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ties_share_mean_rank() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(average_ranks(&[5.0, 5.0, 5.0]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(average_ranks(&[1.0, f64::NAN]).iter().all(|r| r.is_nan()));
    }

    #[test]
    fn test_empty() {
        assert!(average_ranks(&[]).is_empty());
    }

    #[test]
    fn test_rank_columns_independent() {
        let data = Matrix::from_row_slice(3, 2, &[1.0, 30.0, 3.0, 10.0, 2.0, 20.0]);
        let ranked = rank_columns(&data);
        assert_eq!(ranked, Matrix::from_row_slice(3, 2, &[1.0, 3.0, 3.0, 1.0, 2.0, 2.0]));
    }
}
