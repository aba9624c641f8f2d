//! Default values shared by configuration and the permutation runner.

/// Permutations run when none is configured.
pub const DEFAULT_PERMUTATIONS: usize = 1000;

/// Fewest subjects for which a correlation is defined.
pub const MIN_SUBJECTS: usize = 2;

/// Exactly this many groups take part in a comparison.
pub const GROUP_COUNT: usize = 2;

/// Significance level used to highlight cells in reports.
pub const DEFAULT_ALPHA: f64 = 0.05;
