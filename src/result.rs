//! Permutation test result types.

use serde::{Deserialize, Serialize};

use crate::data::GroupLabeling;
use crate::types::{CorrelationMethod, LabeledMatrix, Matrix};

/// Complete result of a group permutation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    /// Statistic computed with the observed group labels.
    pub observed: LabeledMatrix,

    /// Element-wise two-sided empirical p-values, same shape and labels as
    /// `observed`. Every entry lies in `[0, 1]`.
    pub p_values: LabeledMatrix,

    /// Every null statistic, kept when the distribution was requested.
    pub null_distribution: Option<NullDistribution>,

    /// Every permuted labeling, in permutation order, kept when label history
    /// is enabled.
    pub permutation_labels: Option<Vec<GroupLabeling>>,

    /// Run metadata.
    pub metadata: Metadata,
}

impl PermutationResult {
    /// Cells whose p-value is strictly below `alpha`, in row-major order.
    ///
    /// Cells with an undefined (NaN) observed value are never significant.
    pub fn significant(&self, alpha: f64) -> Vec<SignificantCell> {
        let (rows, cols) = self.p_values.shape();
        let mut cells = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                let p = self.p_values.values()[(i, j)];
                let observed = self.observed.values()[(i, j)];
                if p < alpha && !observed.is_nan() {
                    cells.push(SignificantCell {
                        row: self.p_values.row_labels()[i].clone(),
                        col: self.p_values.col_labels()[j].clone(),
                        observed,
                        p_value: p,
                    });
                }
            }
        }
        cells
    }

    /// Smallest p-value, or `None` for an empty statistic.
    pub fn min_p_value(&self) -> Option<f64> {
        self.p_values.values().iter().copied().reduce(f64::min)
    }
}

/// One statistic cell that passed a significance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantCell {
    /// Row label.
    pub row: String,
    /// Column label.
    pub col: String,
    /// Observed statistic value.
    pub observed: f64,
    /// Empirical p-value.
    pub p_value: f64,
}

/// Null statistics, one matrix per permutation in permutation-index order.
///
/// All matrices share the observed statistic's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    samples: Vec<Matrix>,
    rows: usize,
    cols: usize,
}

impl NullDistribution {
    pub(crate) fn new(samples: Vec<Matrix>, shape: (usize, usize)) -> Self {
        Self {
            samples,
            rows: shape.0,
            cols: shape.1,
        }
    }

    /// `(n_permutations, rows, cols)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.samples.len(), self.rows, self.cols)
    }

    /// Null matrix of permutation `index`.
    pub fn get(&self, index: usize) -> Option<&Matrix> {
        self.samples.get(index)
    }

    /// All null matrices.
    pub fn samples(&self) -> &[Matrix] {
        &self.samples
    }

    /// Null values of a single cell across permutations.
    pub fn cell(&self, row: usize, col: usize) -> Vec<f64> {
        self.samples.iter().map(|m| m[(row, col)]).collect()
    }

    /// Number of permutations.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no permutation was kept.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Metadata for reproducing and auditing a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Name of the statistic.
    pub statistic: String,

    /// Correlation method used for the group matrices.
    pub method: CorrelationMethod,

    /// Number of permutations run.
    pub n_permutations: usize,

    /// Root seed of the permutation sub-streams (drawn when none was given).
    pub seed: u64,

    /// The two group labels, first-appearance order.
    pub groups: [String; 2],

    /// Subjects per group, same order as `groups`.
    pub group_sizes: [usize; 2],

    /// Number of regions.
    pub n_regions: usize,

    /// Wall-clock runtime in seconds.
    pub runtime_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result() -> PermutationResult {
        let labels = vec!["A".to_string(), "B".to_string()];
        let observed = LabeledMatrix::new(
            labels.clone(),
            labels.clone(),
            Matrix::from_row_slice(2, 2, &[0.0, 0.4, 0.4, 0.0]),
        )
        .unwrap();
        let p_values = LabeledMatrix::new(
            labels.clone(),
            labels,
            Matrix::from_row_slice(2, 2, &[1.0, 0.01, 0.01, 1.0]),
        )
        .unwrap();
        PermutationResult {
            observed,
            p_values,
            null_distribution: Some(NullDistribution::new(vec![Matrix::zeros(2, 2); 3], (2, 2))),
            permutation_labels: None,
            metadata: Metadata {
                statistic: "correlation_matrix_difference".to_string(),
                method: CorrelationMethod::Pearson,
                n_permutations: 3,
                seed: 42,
                groups: ["young".to_string(), "old".to_string()],
                group_sizes: [3, 3],
                n_regions: 2,
                runtime_secs: 0.01,
            },
        }
    }

    #[test]
    fn test_significant_cells() {
        let result = make_result();
        let cells = result.significant(0.05);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].row, "A");
        assert_eq!(cells[0].col, "B");
        assert_eq!(cells[0].observed, 0.4);
        assert!(result.significant(0.01).is_empty());
        assert_eq!(result.min_p_value(), Some(0.01));
    }

    #[test]
    fn test_nan_observed_never_significant() {
        let mut result = make_result();
        let labels = vec!["A".to_string(), "B".to_string()];
        result.observed = LabeledMatrix::new(
            labels.clone(),
            labels.clone(),
            Matrix::from_row_slice(2, 2, &[f64::NAN, f64::NAN, f64::NAN, 0.3]),
        )
        .unwrap();
        // NaN never reaches the observed value, so those cells carry p = 0
        result.p_values = LabeledMatrix::new(
            labels.clone(),
            labels,
            Matrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 0.02]),
        )
        .unwrap();

        let cells = result.significant(0.05);
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].row.as_str(), cells[0].col.as_str()), ("B", "B"));
    }

    #[test]
    fn test_null_distribution_dims() {
        let result = make_result();
        let null = result.null_distribution.unwrap();
        assert_eq!(null.dims(), (3, 2, 2));
        assert_eq!(null.cell(0, 1), vec![0.0; 3]);
        assert!(null.get(3).is_none());
    }
}
