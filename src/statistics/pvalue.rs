//! Element-wise empirical p-values from a null distribution.

use crate::error::{Error, Result};
use crate::types::{LabeledMatrix, Matrix};

/// Two-sided empirical p-values.
///
/// For each position, the fraction of null matrices whose absolute value is
/// at least the absolute observed value:
///
/// ```text
/// p[i,j] = #{k : |null_k[i,j]| >= |observed[i,j]|} / N
/// ```
///
/// A large negative shift counts the same as a large positive one. NaN never
/// compares as "at least as extreme", so a NaN observed cell gets p = 0.
///
/// # Returns
///
/// A matrix with the observed statistic's shape and labels.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if `null` is empty
/// - [`Error::ShapeMismatch`] if any null matrix differs in shape from `observed`
pub fn empirical_p_values(observed: &LabeledMatrix, null: &[Matrix]) -> Result<LabeledMatrix> {
    if null.is_empty() {
        return Err(Error::InvalidParameter(
            "null distribution is empty".to_string(),
        ));
    }

    let shape = observed.shape();
    let threshold = observed.values().abs();
    let mut exceed = Matrix::zeros(shape.0, shape.1);

    for (k, sample) in null.iter().enumerate() {
        if sample.shape() != shape {
            return Err(Error::ShapeMismatch {
                statistic: "null distribution".to_string(),
                permutation: Some(k),
                expected: shape,
                found: sample.shape(),
            });
        }
        for ((count, &value), &limit) in exceed.iter_mut().zip(sample.iter()).zip(threshold.iter()) {
            if value.abs() >= limit {
                *count += 1.0;
            }
        }
    }

    Ok(observed.with_values(exceed / null.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(values: &[f64]) -> LabeledMatrix {
        LabeledMatrix::new(
            (0..values.len()).map(|i| format!("r{i}")).collect(),
            vec!["stat".to_string()],
            Matrix::from_column_slice(values.len(), 1, values),
        )
        .unwrap()
    }

    #[test]
    fn test_counts_absolute_exceedances() {
        let obs = observed(&[0.5, -2.0]);
        let null = vec![
            Matrix::from_column_slice(2, 1, &[0.1, 2.5]),
            Matrix::from_column_slice(2, 1, &[-0.6, -1.0]),
            Matrix::from_column_slice(2, 1, &[0.5, 0.0]),
            Matrix::from_column_slice(2, 1, &[0.2, -2.0]),
        ];
        let p = empirical_p_values(&obs, &null).unwrap();

        assert_eq!(p.shape(), (2, 1));
        assert_eq!(p.row_labels(), obs.row_labels());
        // |-0.6| and |0.5| reach 0.5; |2.5| and |-2.0| reach 2.0
        assert_eq!(p.get(0, 0), Some(0.5));
        assert_eq!(p.get(1, 0), Some(0.5));
    }

    #[test]
    fn test_bounds() {
        let obs = observed(&[0.0, 100.0]);
        let null = vec![Matrix::from_column_slice(2, 1, &[1.0, 1.0]); 3];
        let p = empirical_p_values(&obs, &null).unwrap();
        assert_eq!(p.get(0, 0), Some(1.0));
        assert_eq!(p.get(1, 0), Some(0.0));
    }

    #[test]
    fn test_nan_never_exceeds() {
        let obs = observed(&[f64::NAN, 1.0]);
        let null = vec![Matrix::from_column_slice(2, 1, &[5.0, f64::NAN])];
        let p = empirical_p_values(&obs, &null).unwrap();
        assert_eq!(p.get(0, 0), Some(0.0));
        assert_eq!(p.get(1, 0), Some(0.0));
    }

    #[test]
    fn test_empty_null_rejected() {
        let obs = observed(&[1.0]);
        assert!(matches!(
            empirical_p_values(&obs, &[]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_shape_checked() {
        let obs = observed(&[1.0, 2.0]);
        let null = vec![Matrix::zeros(1, 1)];
        assert!(matches!(
            empirical_p_values(&obs, &null),
            Err(Error::ShapeMismatch { permutation: Some(0), .. })
        ));
    }
}
