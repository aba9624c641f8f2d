//! Property tests for label permutation, correlation and p-values.

use proptest::prelude::*;

use popconn::statistics::{compute_covariance, empirical_p_values, permutation_rng, permute_labels};
use popconn::{
    run_permutation_test, CorrelationMethod, Dataset, GroupLabeling, LabeledMatrix, Matrix,
    StatisticRegistry, WideTable,
};

fn labeling_strategy() -> impl Strategy<Value = GroupLabeling> {
    (1usize..8, 1usize..8).prop_map(|(a, b)| {
        let subjects = (0..a + b).map(|i| format!("s{i}")).collect();
        let labels = std::iter::repeat("a")
            .take(a)
            .chain(std::iter::repeat("b").take(b))
            .map(String::from)
            .collect();
        GroupLabeling::new(subjects, labels).unwrap()
    })
}

fn table_strategy() -> impl Strategy<Value = WideTable> {
    (2usize..9, 1usize..5).prop_flat_map(|(n, p)| {
        prop::collection::vec(-100.0f64..100.0, n * p).prop_map(move |values| {
            WideTable::new(
                (0..n).map(|i| format!("s{i}")).collect(),
                (0..p).map(|j| format!("r{j}")).collect(),
                Matrix::from_row_slice(n, p, &values),
            )
            .unwrap()
        })
    })
}

proptest! {
    #[test]
    fn permutation_preserves_label_multiset(labeling in labeling_strategy(), seed: u64, index in 0usize..1000) {
        let permuted = permute_labels(&labeling, &mut permutation_rng(seed, index)).unwrap();
        prop_assert_eq!(permuted.counts(), labeling.counts());
        prop_assert_eq!(permuted.subjects(), labeling.subjects());
    }

    #[test]
    fn permutation_is_reproducible(labeling in labeling_strategy(), seed: u64, index in 0usize..1000) {
        let a = permute_labels(&labeling, &mut permutation_rng(seed, index)).unwrap();
        let b = permute_labels(&labeling, &mut permutation_rng(seed, index)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn correlation_is_symmetric_and_bounded(table in table_strategy()) {
        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman, CorrelationMethod::Kendall] {
            let m = compute_covariance(&table, method).unwrap();
            let p = table.n_regions();
            prop_assert_eq!(m.shape(), (p, p));
            for i in 0..p {
                for j in 0..p {
                    let v = m.values()[(i, j)];
                    prop_assert_eq!(v.to_bits(), m.values()[(j, i)].to_bits());
                    prop_assert!(v.is_nan() || (-1.0..=1.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn p_values_in_unit_interval(
        observed in prop::collection::vec(-5.0f64..5.0, 4),
        null in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 4), 1..30),
    ) {
        let obs = LabeledMatrix::new(
            (0..4).map(|i| format!("r{i}")).collect(),
            vec!["stat".to_string()],
            Matrix::from_column_slice(4, 1, &observed),
        )
        .unwrap();
        let null: Vec<Matrix> = null.iter().map(|v| Matrix::from_column_slice(4, 1, v)).collect();

        let p = empirical_p_values(&obs, &null).unwrap();
        prop_assert_eq!(p.shape(), obs.shape());
        for &v in p.values().iter() {
            prop_assert!((0.0..=1.0).contains(&v));
            // Resolution is 1/N
            let scaled = v * null.len() as f64;
            prop_assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn observed_and_p_value_shapes_agree(
        values in prop::collection::vec(-10.0f64..10.0, 8 * 3),
        seed: u64,
    ) {
        let subjects = ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8"];
        let dataset = Dataset::from_wide(&subjects, &["A", "B", "C"], &Matrix::from_row_slice(8, 3, &values))
            .unwrap()
            .with_subject_column(
                "group",
                subjects.iter().enumerate().map(|(i, s)| (*s, if i < 4 { "ctrl" } else { "case" })),
            )
            .unwrap();

        let registry = StatisticRegistry::builtin();
        for statistic in registry.iter() {
            let result = run_permutation_test(&dataset, "group", statistic.as_ref(), 8, false, Some(seed)).unwrap();
            prop_assert_eq!(result.observed.shape(), result.p_values.shape());
            prop_assert!(result.p_values.values().iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }
}
