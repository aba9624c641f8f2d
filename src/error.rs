//! Error type shared by every stage of a permutation test.

use thiserror::Error;

/// Errors raised while building datasets, computing correlations or running
/// permutation tests.
///
/// Every variant is fatal for the run that produced it; there is no partial
/// result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The group column does not hold exactly two distinct values.
    #[error("expected exactly 2 groups in column '{column}', found {}: {labels:?}", .labels.len())]
    GroupCount {
        /// Name of the grouping column.
        column: String,
        /// Distinct values found, in order of first appearance.
        labels: Vec<String>,
    },

    /// A labeling handed to the permutation engine does not have exactly two labels.
    #[error("label permutation needs exactly 2 distinct labels, found {found}")]
    InvalidGroupCount {
        /// Number of distinct labels in the labeling.
        found: usize,
    },

    /// Too few subjects for a correlation to be defined.
    #[error("{context} has {subjects} subject(s); correlation needs at least 2")]
    InsufficientData {
        /// What was being correlated (e.g. `group 'young'`).
        context: String,
        /// Number of subjects available.
        subjects: usize,
    },

    /// A statistic returned a shape different from the observed statistic.
    #[error(
        "statistic '{statistic}' returned shape {found:?}{}, expected {expected:?}",
        .permutation.map(|i| format!(" at permutation {i}")).unwrap_or_default()
    )]
    ShapeMismatch {
        /// Name of the offending statistic.
        statistic: String,
        /// Permutation index, `None` for the observed call.
        permutation: Option<usize>,
        /// Shape established by the observed statistic (or declared by the statistic).
        expected: (usize, usize),
        /// Shape actually returned.
        found: (usize, usize),
    },

    /// A configuration value or argument is malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The dataset has no column with this name.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// No statistic is registered under this name.
    #[error("unknown statistic '{0}'")]
    UnknownStatistic(String),

    /// A subject present in the data is missing from a labeling.
    #[error("subject '{0}' has no group label")]
    UnknownSubject(String),

    /// One subject carries two different labels across its rows.
    #[error("subject '{subject}' is labeled both '{first}' and '{second}'")]
    InconsistentLabel {
        /// Subject identifier.
        subject: String,
        /// Label seen first.
        first: String,
        /// Conflicting label seen later.
        second: String,
    },

    /// The same (subject, region) pair appears more than once.
    #[error("duplicate measurement for subject '{subject}', region '{region}'")]
    DuplicateMeasurement {
        /// Subject identifier.
        subject: String,
        /// Region name.
        region: String,
    },

    /// A subject lacks a region that other subjects have.
    #[error("subject '{subject}' has no measurement for region '{region}'")]
    IncompleteSubject {
        /// Subject identifier.
        subject: String,
        /// Missing region.
        region: String,
    },

    /// Two matrices that must share region labels do not.
    #[error("matrices are not region-aligned: {left:?} vs {right:?}")]
    MisalignedRegions {
        /// Row labels of the first matrix.
        left: Vec<String>,
        /// Row labels of the second matrix.
        right: Vec<String>,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
