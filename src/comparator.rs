//! Group permutation test runner and its builder.

use std::time::Instant;

use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::constants::{GROUP_COUNT, MIN_SUBJECTS};
use crate::data::{Dataset, GroupLabeling, WideTable};
use crate::error::{Error, Result};
use crate::metrics::{Statistic, StatisticRegistry};
use crate::result::{Metadata, NullDistribution, PermutationResult};
use crate::statistics::{compute_covariance, empirical_p_values, permutation_rng, permute_labels};
use crate::types::{CorrelationMethod, CovarianceMatrix, LabeledMatrix, Matrix};

/// Builder for group permutation tests.
///
/// # Example
///
/// ```ignore
/// use popconn::{PermutationTest, StatisticRegistry};
///
/// let registry = StatisticRegistry::builtin();
/// let statistic = registry.get("strength_difference")?;
///
/// let result = PermutationTest::new()
///     .permutations(5_000)
///     .method(CorrelationMethod::Spearman)
///     .seed(42)
///     .run(&dataset, "group", statistic.as_ref())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermutationTest {
    config: Config,
}

impl PermutationTest {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a reduced permutation count for exploration and tests.
    ///
    /// Settings:
    /// - 100 permutations (vs 1,000 default)
    pub fn quick() -> Self {
        Self {
            config: Config {
                n_permutations: 100,
                ..Config::default()
            },
        }
    }

    /// Create from an existing configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the correlation method.
    pub fn method(mut self, method: CorrelationMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Set the number of permutations.
    pub fn permutations(mut self, n: usize) -> Self {
        self.config.n_permutations = n;
        self
    }

    /// Keep every null statistic in the result.
    pub fn return_distribution(mut self, keep: bool) -> Self {
        self.config.return_distribution = keep;
        self
    }

    /// Keep every permuted labeling in the result.
    pub fn keep_label_history(mut self, keep: bool) -> Self {
        self.config.keep_label_history = keep;
        self
    }

    /// Set the root seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the test on `dataset`, splitting subjects by `group_column`.
    ///
    /// The configuration is validated before any data is touched.
    pub fn run(
        &self,
        dataset: &Dataset,
        group_column: &str,
        statistic: &dyn Statistic,
    ) -> Result<PermutationResult> {
        self.config.validate()?;
        GroupComparator::new(dataset, group_column)?
            .with_config(self.config.clone())
            .run(statistic)
    }
}

/// A two-group comparison prepared from one dataset.
///
/// Construction resolves the observed labeling and pivots the dataset once;
/// the comparator can then run any number of statistics against it.
#[derive(Debug, Clone)]
pub struct GroupComparator {
    labeling: GroupLabeling,
    table: WideTable,
    /// Wide-table row of each labeling subject, same order as the labeling.
    rows: Vec<usize>,
    groups: [String; 2],
    config: Config,
}

impl GroupComparator {
    /// Prepare a comparison of the two groups in `group_column`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownColumn`] if the column is missing
    /// - [`Error::InconsistentLabel`] if a subject carries two labels
    /// - [`Error::GroupCount`] unless the column holds exactly two values
    /// - [`Error::InsufficientData`] if a group has fewer than two subjects
    /// - pivot errors from [`WideTable::from_dataset`]
    pub fn new(dataset: &Dataset, group_column: &str) -> Result<Self> {
        let labeling = GroupLabeling::from_dataset(dataset, group_column)?;

        let found = labeling.groups();
        if found.len() != GROUP_COUNT {
            return Err(Error::GroupCount {
                column: group_column.to_string(),
                labels: found.iter().map(|l| l.to_string()).collect(),
            });
        }
        let groups = [found[0].to_string(), found[1].to_string()];

        let counts = labeling.counts();
        for group in &groups {
            let size = counts.get(group.as_str()).copied().unwrap_or(0);
            if size < MIN_SUBJECTS {
                return Err(Error::InsufficientData {
                    context: format!("group '{group}'"),
                    subjects: size,
                });
            }
        }

        let table = WideTable::from_dataset(dataset)?;
        let index = table.row_index();
        let rows = labeling
            .subjects()
            .iter()
            .map(|s| {
                index
                    .get(s.as_str())
                    .copied()
                    .ok_or_else(|| Error::UnknownSubject(s.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            labeling,
            table,
            rows,
            groups,
            config: Config::default(),
        })
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The observed labeling.
    pub fn labeling(&self) -> &GroupLabeling {
        &self.labeling
    }

    /// The pivoted subject × region table.
    pub fn table(&self) -> &WideTable {
        &self.table
    }

    /// The two group labels; the first is the label appearing first in the data.
    pub fn groups(&self) -> &[String; 2] {
        &self.groups
    }

    /// Correlation matrices of both groups under `labeling`.
    pub fn group_covariances(&self, labeling: &GroupLabeling) -> Result<(CovarianceMatrix, CovarianceMatrix)> {
        let method = self.config.method;
        let a = compute_covariance(&self.split(labeling, &self.groups[0]), method)?;
        let b = compute_covariance(&self.split(labeling, &self.groups[1]), method)?;
        Ok((a, b))
    }

    /// Compute `statistic` for the observed groups.
    pub fn observed(&self, statistic: &dyn Statistic) -> Result<LabeledMatrix> {
        let (a, b) = self.group_covariances(&self.labeling)?;
        let observed = statistic.compute(&a, &b)?;

        if let Some(expected) = statistic.output_shape(self.table.n_regions()) {
            if observed.shape() != expected {
                return Err(Error::ShapeMismatch {
                    statistic: statistic.name().to_string(),
                    permutation: None,
                    expected,
                    found: observed.shape(),
                });
            }
        }
        Ok(observed)
    }

    /// Run the permutation test for `statistic`.
    ///
    /// # Returns
    ///
    /// Observed statistic, element-wise p-values, and optionally the null
    /// distribution and permuted labelings. Any failing permutation aborts
    /// the run.
    pub fn run(&self, statistic: &dyn Statistic) -> Result<PermutationResult> {
        self.config.validate()?;
        let start = Instant::now();
        let n_permutations = self.config.n_permutations;
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());

        info!(
            statistic = statistic.name(),
            groups = ?self.groups,
            n_permutations,
            seed,
            method = self.config.method.as_str(),
            "starting permutation test"
        );

        let observed = self.observed(statistic)?;
        debug!(shape = ?observed.shape(), "observed statistic computed");

        let stage = NullStage::new(self, statistic, seed, observed.shape());
        let samples = self.run_null(&stage)?;

        let mut values = Vec::with_capacity(samples.len());
        let mut labelings = Vec::new();
        for sample in samples {
            values.push(sample.values);
            labelings.extend(sample.labeling);
        }

        debug!(n_samples = values.len(), "aggregating null distribution");
        let p_values = empirical_p_values(&observed, &values)?;

        let counts = self.labeling.counts();
        let group_sizes = [
            counts.get(self.groups[0].as_str()).copied().unwrap_or(0),
            counts.get(self.groups[1].as_str()).copied().unwrap_or(0),
        ];
        let runtime_secs = start.elapsed().as_secs_f64();

        info!(
            statistic = statistic.name(),
            runtime_secs,
            "permutation test finished"
        );

        Ok(PermutationResult {
            null_distribution: self
                .config
                .return_distribution
                .then(|| NullDistribution::new(values, observed.shape())),
            permutation_labels: self.config.keep_label_history.then_some(labelings),
            p_values,
            metadata: Metadata {
                statistic: statistic.name().to_string(),
                method: self.config.method,
                n_permutations,
                seed,
                groups: self.groups.clone(),
                group_sizes,
                n_regions: self.table.n_regions(),
                runtime_secs,
            },
            observed,
        })
    }

    #[cfg(feature = "parallel")]
    fn run_null(&self, stage: &NullStage<'_>) -> Result<Vec<NullSample>> {
        use rayon::prelude::*;

        let n = self.config.n_permutations;
        crate::thread_pool::install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| stage.run(i))
                .collect::<Result<Vec<_>>>()
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn run_null(&self, stage: &NullStage<'_>) -> Result<Vec<NullSample>> {
        (0..self.config.n_permutations)
            .map(|i| stage.run(i))
            .collect()
    }

    fn split(&self, labeling: &GroupLabeling, group: &str) -> WideTable {
        let rows: Vec<usize> = labeling
            .labels()
            .iter()
            .zip(&self.rows)
            .filter(|(label, _)| label.as_str() == group)
            .map(|(_, &row)| row)
            .collect();
        self.table.select(&rows)
    }
}

/// One permutation's statistic and the labeling that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NullSample {
    /// Permuted statistic values.
    pub values: Matrix,
    /// Permuted labeling, kept only when label history is enabled.
    pub labeling: Option<GroupLabeling>,
}

/// The per-permutation step: permute, split, recompute, apply.
///
/// Pure in `index`: the same stage and index always give the same sample,
/// whichever thread runs it and in whatever order.
pub struct NullStage<'a> {
    comparator: &'a GroupComparator,
    statistic: &'a dyn Statistic,
    root_seed: u64,
    shape: (usize, usize),
    keep_labeling: bool,
}

impl<'a> NullStage<'a> {
    /// Stage for `statistic` on `comparator`, expecting outputs of `shape`.
    ///
    /// Permuted labelings are returned only if the comparator's configuration
    /// keeps label history.
    pub fn new(
        comparator: &'a GroupComparator,
        statistic: &'a dyn Statistic,
        root_seed: u64,
        shape: (usize, usize),
    ) -> Self {
        Self {
            comparator,
            statistic,
            root_seed,
            shape,
            keep_labeling: comparator.config.keep_label_history,
        }
    }

    /// Compute the null statistic of permutation `index`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the output shape differs from
    /// the observed one.
    pub fn run(&self, index: usize) -> Result<NullSample> {
        let mut rng = permutation_rng(self.root_seed, index);
        let labeling = permute_labels(&self.comparator.labeling, &mut rng)?;

        let (a, b) = self.comparator.group_covariances(&labeling)?;
        let values = self.statistic.compute(&a, &b)?.into_values();

        if values.shape() != self.shape {
            return Err(Error::ShapeMismatch {
                statistic: self.statistic.name().to_string(),
                permutation: Some(index),
                expected: self.shape,
                found: values.shape(),
            });
        }
        trace!(permutation = index, "null statistic computed");

        Ok(NullSample {
            values,
            labeling: self.keep_labeling.then_some(labeling),
        })
    }
}

/// Run a permutation test with explicit parameters.
///
/// # Arguments
///
/// * `dataset` - Long-form measurements with a group column
/// * `group_column` - Column holding exactly two group labels
/// * `statistic` - Statistic comparing the two groups' correlation matrices
/// * `n_permutations` - Number of label permutations (must be positive)
/// * `return_distribution` - Keep the null statistics in the result
/// * `seed` - Root seed; `None` draws one and records it in the metadata
pub fn run_permutation_test(
    dataset: &Dataset,
    group_column: &str,
    statistic: &dyn Statistic,
    n_permutations: usize,
    return_distribution: bool,
    seed: Option<u64>,
) -> Result<PermutationResult> {
    PermutationTest::with_config(Config {
        n_permutations,
        return_distribution,
        seed,
        ..Config::default()
    })
    .run(dataset, group_column, statistic)
}

/// Compare the correlation matrices of two groups element-wise.
///
/// Runs `correlation_matrix_difference` under `config`.
pub fn compare_groups(dataset: &Dataset, group_column: &str, config: &Config) -> Result<PermutationResult> {
    let statistic = StatisticRegistry::builtin().get("correlation_matrix_difference")?;
    PermutationTest::with_config(config.clone()).run(dataset, group_column, statistic.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::metrics::{frobenius_norm_difference, FnStatistic};

    fn fixture() -> Dataset {
        let values = [
            1.0, 2.0, 3.0, 1.2, 2.1, 2.9, 0.8, 1.9, 2.7, 1.1, 1.8, 3.1, 1.3, 2.3, 2.8, 1.0, 2.0, 3.0,
        ];
        let subjects = ["s1", "s2", "s3", "s4", "s5", "s6"];
        let regions = ["A", "B", "C"];
        let dataset =
            Dataset::from_wide(&subjects, &regions, &Matrix::from_row_slice(6, 3, &values)).unwrap();
        let mut groups = vec!["young"; 9];
        groups.extend(vec!["old"; 9]);
        dataset.with_column("group", groups).unwrap()
    }

    type StatFn = fn(&CovarianceMatrix, &CovarianceMatrix) -> Result<LabeledMatrix>;

    fn frobenius() -> FnStatistic<StatFn> {
        FnStatistic::new("frobenius", frobenius_norm_difference)
    }

    #[test]
    fn test_comparator_groups_in_appearance_order() {
        let comparator = GroupComparator::new(&fixture(), "group").unwrap();
        assert_eq!(comparator.groups(), &["young".to_string(), "old".to_string()]);
        assert_eq!(comparator.table().n_subjects(), 6);
    }

    #[test]
    fn test_group_covariances() {
        let comparator = GroupComparator::new(&fixture(), "group").unwrap();
        let (a, b) = comparator.group_covariances(comparator.labeling()).unwrap();
        for m in [a, b] {
            assert_eq!(m.shape(), (3, 3));
            for i in 0..3 {
                assert_eq!(m.get(i, i), Some(1.0));
            }
        }
    }

    #[test]
    fn test_small_group_rejected() {
        let dataset = fixture();
        let mut groups = vec!["young"; 3];
        groups.extend(vec!["old"; 15]);
        let dataset = dataset.with_column("split", groups).unwrap();
        let err = GroupComparator::new(&dataset, "split").unwrap_err();
        assert!(matches!(err, Error::InsufficientData { subjects: 1, .. }));
    }

    #[test]
    fn test_null_stage_is_pure() {
        let comparator = GroupComparator::new(&fixture(), "group").unwrap();
        let stat = frobenius();
        let stage = NullStage::new(&comparator, &stat, 9, (1, 1));
        assert_eq!(stage.run(4).unwrap(), stage.run(4).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let comparator = GroupComparator::new(&fixture(), "group")
            .unwrap()
            .with_config(Config {
                n_permutations: 25,
                return_distribution: true,
                seed: Some(3),
                ..Config::default()
            });
        let stat = frobenius();
        let result = comparator.run(&stat).unwrap();

        let stage = NullStage::new(&comparator, &stat, 3, (1, 1));
        let sequential: Vec<Matrix> = (0..25).map(|i| stage.run(i).unwrap().values).collect();
        assert_eq!(result.null_distribution.unwrap().samples(), sequential.as_slice());
    }

    #[test]
    fn test_declared_shape_checked_on_observed() {
        struct Liar;
        impl Statistic for Liar {
            fn name(&self) -> &str {
                "liar"
            }
            fn compute(&self, _: &CovarianceMatrix, _: &CovarianceMatrix) -> Result<LabeledMatrix> {
                Ok(LabeledMatrix::scalar("x", "y", 0.0))
            }
            fn output_shape(&self, n: usize) -> Option<(usize, usize)> {
                Some((n, 1))
            }
        }

        let comparator = GroupComparator::new(&fixture(), "group").unwrap();
        let err = comparator.observed(&Liar).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { permutation: None, .. }));
    }

    #[test]
    fn test_unseeded_run_records_seed() {
        let stat = frobenius();
        let first = PermutationTest::new()
            .permutations(5)
            .return_distribution(true)
            .run(&fixture(), "group", &stat)
            .unwrap();
        let replay = PermutationTest::new()
            .permutations(5)
            .return_distribution(true)
            .seed(first.metadata.seed)
            .run(&fixture(), "group", &stat)
            .unwrap();
        assert_eq!(first.p_values, replay.p_values);
        assert_eq!(first.null_distribution, replay.null_distribution);
    }

    #[test]
    fn test_builder_settings() {
        let test = PermutationTest::quick()
            .method(CorrelationMethod::Kendall)
            .keep_label_history(false)
            .seed(1);
        assert_eq!(test.config().n_permutations, 100);
        assert_eq!(test.config().method, CorrelationMethod::Kendall);
        assert!(!test.config().keep_label_history);
        assert_eq!(test.config().seed, Some(1));
    }

    #[test]
    fn test_null_stage_drops_labeling_without_history() {
        let stat = frobenius();
        let with_history = GroupComparator::new(&fixture(), "group").unwrap();
        let without_history = with_history.clone().with_config(Config {
            keep_label_history: false,
            ..Config::default()
        });

        let kept = NullStage::new(&with_history, &stat, 5, (1, 1)).run(2).unwrap();
        let dropped = NullStage::new(&without_history, &stat, 5, (1, 1)).run(2).unwrap();
        assert!(kept.labeling.is_some());
        assert!(dropped.labeling.is_none());
        assert_eq!(kept.values, dropped.values);
    }

    #[test]
    fn test_statistic_error_aborts_run() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let stat = FnStatistic::new("fails_after_observed", |a: &CovarianceMatrix, b: &CovarianceMatrix| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                frobenius_norm_difference(a, b)
            } else {
                Err(Error::InvalidParameter("null sample rejected".to_string()))
            }
        });

        let err = PermutationTest::new()
            .permutations(6)
            .seed(8)
            .run(&fixture(), "group", &stat)
            .unwrap_err();
        assert_eq!(err, Error::InvalidParameter("null sample rejected".to_string()));
    }

    #[test]
    fn test_rows_follow_labeling_order() {
        // Subjects appear in reverse of the pivot's sorted order
        let reversed: Vec<Record> = fixture()
            .rows()
            .rev()
            .map(|(subject, region, value)| Record::new(subject, region, value))
            .collect();
        let dataset = Dataset::from_records(reversed)
            .with_subject_column(
                "group",
                [("s1", "young"), ("s2", "young"), ("s3", "young"), ("s4", "old"), ("s5", "old"), ("s6", "old")],
            )
            .unwrap();

        let comparator = GroupComparator::new(&dataset, "group").unwrap();
        assert_eq!(comparator.groups(), &["old".to_string(), "young".to_string()]);
        for (subject, &row) in comparator.labeling().subjects().iter().zip(&comparator.rows) {
            assert_eq!(&comparator.table().subjects()[row], subject);
        }

        let sorted = GroupComparator::new(&fixture(), "group").unwrap();
        let (young, old) = sorted.group_covariances(sorted.labeling()).unwrap();
        let (old_r, young_r) = comparator.group_covariances(comparator.labeling()).unwrap();
        // Row order within a group changes summation order only
        for (x, y) in [(&young, &young_r), (&old, &old_r)] {
            assert_eq!(x.row_labels(), y.row_labels());
            assert!((x.values() - y.values()).amax() < 1e-12);
        }
    }

    #[test]
    fn test_label_history_gated() {
        let stat = frobenius();
        let result = PermutationTest::new()
            .permutations(4)
            .keep_label_history(false)
            .seed(0)
            .run(&fixture(), "group", &stat)
            .unwrap();
        assert!(result.permutation_labels.is_none());
        assert!(result.null_distribution.is_none());
    }
}
