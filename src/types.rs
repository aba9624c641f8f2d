//! Matrix types and common enums.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dense matrix of `f64` used for every numeric table in the crate.
pub type Matrix = DMatrix<f64>;

/// Region × region correlation matrix of one group.
///
/// Row and column labels are the same ordered region list.
pub type CovarianceMatrix = LabeledMatrix;

/// Correlation method used to build a covariance connectome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Pearson product-moment correlation.
    #[default]
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
    /// Kendall tau-b rank correlation.
    Kendall,
}

impl CorrelationMethod {
    /// Lowercase name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        }
    }
}

impl std::str::FromStr for CorrelationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(Error::InvalidParameter(format!(
                "unknown correlation method '{other}' (expected pearson, spearman or kendall)"
            ))),
        }
    }
}

impl std::fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A matrix with named rows and columns.
///
/// Used for covariance matrices (regions on both axes), statistic outputs
/// (regions × 1, 1 × 1, ...) and p-value matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledMatrix {
    rows: Vec<String>,
    cols: Vec<String>,
    values: Matrix,
}

impl LabeledMatrix {
    /// Wrap `values` with row and column labels.
    ///
    /// Fails with [`Error::InvalidParameter`] if the label counts do not match
    /// the matrix dimensions.
    pub fn new(rows: Vec<String>, cols: Vec<String>, values: Matrix) -> Result<Self> {
        if rows.len() != values.nrows() || cols.len() != values.ncols() {
            return Err(Error::InvalidParameter(format!(
                "{} row label(s) and {} column label(s) for a {}x{} matrix",
                rows.len(),
                cols.len(),
                values.nrows(),
                values.ncols()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// A 1 × 1 matrix holding `value`.
    pub fn scalar(row: &str, col: &str, value: f64) -> Self {
        Self {
            rows: vec![row.to_string()],
            cols: vec![col.to_string()],
            values: Matrix::from_element(1, 1, value),
        }
    }

    /// Same labels as `self`, different values of the same shape.
    pub(crate) fn with_values(&self, values: Matrix) -> Self {
        debug_assert_eq!(values.shape(), self.values.shape());
        Self {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            values,
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Row labels.
    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    /// Column labels.
    pub fn col_labels(&self) -> &[String] {
        &self.cols
    }

    /// Underlying values.
    pub fn values(&self) -> &Matrix {
        &self.values
    }

    /// Consume and return the underlying values.
    pub fn into_values(self) -> Matrix {
        self.values
    }

    /// Value at `(row, col)` by position.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Value at the named row and column.
    pub fn get_by_label(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.cols.iter().position(|c| c == col)?;
        self.get(i, j)
    }

    /// Whether any entry is NaN.
    pub fn has_nan(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    /// Check that `other` has the same row and column labels, in order.
    pub fn ensure_aligned(&self, other: &LabeledMatrix) -> Result<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(Error::MisalignedRegions {
                left: self.rows.clone(),
                right: other.rows.clone(),
            });
        }
        Ok(())
    }
}
