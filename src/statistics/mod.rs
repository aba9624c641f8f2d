//! Statistical building blocks for covariance-connectome permutation tests.
//!
//! - Rank transforms for Spearman correlation
//! - Pearson / Spearman / Kendall correlation matrices across subjects
//! - Seeded subject-level label permutation
//! - Element-wise empirical p-values

mod correlation;
mod permutation;
mod pvalue;
mod rank;

pub use correlation::{compute_covariance, kendall_tau_b};
pub use permutation::{counter_rng_seed, permutation_rng, permute_labels};
pub use pvalue::empirical_p_values;
pub use rank::{average_ranks, rank_columns};
