//! # popconn
//!
//! Permutation tests for group differences in population covariance
//! connectomes.
//!
//! Given subjects measured on a common set of brain regions and split into
//! two groups, each group's region × region correlation matrix (its
//! "covariance connectome") is compared with a chosen statistic. Group labels
//! are then shuffled at the subject level to build a null distribution,
//! yielding element-wise empirical p-values:
//! - Observed statistic (matrix, vector or scalar)
//! - Two-sided p-value for every statistic cell
//! - Optionally the full null distribution and every permuted labeling
//!
//! ## Quick Start
//!
//! ```ignore
//! use popconn::{Dataset, Record, StatisticRegistry, run_permutation_test};
//!
//! let dataset = Dataset::from_records(records)
//!     .with_subject_column("group", subject_groups)?;
//!
//! let registry = StatisticRegistry::builtin();
//! let statistic = registry.get("correlation_matrix_difference")?;
//!
//! let result = run_permutation_test(&dataset, "group", statistic.as_ref(), 1000, false, Some(42))?;
//! for cell in result.significant(0.05) {
//!     println!("{} / {}: p = {:.3}", cell.row, cell.col, cell.p_value);
//! }
//! ```
//!
//! ## Reproducibility
//!
//! Permutation `i` draws from its own generator seeded from `(seed, i)`, so
//! results do not depend on thread count or scheduling. An unseeded run
//! records the seed it drew in [`Metadata::seed`].

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod comparator;
mod config;
mod constants;
mod error;
mod result;
mod thread_pool;
mod types;

// Functional modules
pub mod data;
pub mod metrics;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use comparator::{
    compare_groups, run_permutation_test, GroupComparator, NullSample, NullStage, PermutationTest,
};
pub use config::Config;
pub use constants::{DEFAULT_ALPHA, DEFAULT_PERMUTATIONS, GROUP_COUNT, MIN_SUBJECTS};
pub use data::{Dataset, GroupLabeling, Record, WideTable};
pub use error::{Error, Result};
pub use metrics::{FnStatistic, Statistic, StatisticRegistry};
pub use result::{Metadata, NullDistribution, PermutationResult, SignificantCell};
pub use statistics::compute_covariance;
pub use types::{CorrelationMethod, CovarianceMatrix, LabeledMatrix, Matrix};

/// Convenience function comparing two groups' correlation matrices.
///
/// Runs `correlation_matrix_difference` with default configuration
/// (Pearson, 1,000 permutations, fresh seed).
///
/// # Arguments
///
/// * `dataset` - Long-form measurements
/// * `group_column` - Column holding exactly two group labels
///
/// # Returns
///
/// A `PermutationResult` with the region × region difference and its p-values.
pub fn compare(dataset: &Dataset, group_column: &str) -> Result<PermutationResult> {
    compare_groups(dataset, group_column, &Config::default())
}
