//! Long-form measurement table.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::GroupLabeling;
use crate::error::{Error, Result};
use crate::types::Matrix;

/// One measurement: a subject's value for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Subject identifier.
    pub subject: String,
    /// Region (feature) name.
    pub region: String,
    /// Measured value.
    pub value: f64,
}

impl Record {
    /// Build a record from anything string-like.
    pub fn new(subject: impl Into<String>, region: impl Into<String>, value: f64) -> Self {
        Self {
            subject: subject.into(),
            region: region.into(),
            value,
        }
    }
}

/// Long-form dataset: one row per (subject, region, value) plus any number of
/// named per-row categorical columns.
///
/// A dataset is immutable once built; the `with_*` methods consume and return
/// it. All rows of a subject are expected to carry the same group label, which
/// is what lets a permutation move a subject's rows together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    subjects: Vec<String>,
    regions: Vec<String>,
    values: Vec<f64>,
    columns: BTreeMap<String, Vec<String>>,
}

impl Dataset {
    /// Build a long-form dataset from records, keeping their order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut dataset = Self::default();
        for record in records {
            dataset.subjects.push(record.subject);
            dataset.regions.push(record.region);
            dataset.values.push(record.value);
        }
        dataset
    }

    /// Build a dataset from a wide subject × region table.
    ///
    /// `values` has one row per subject and one column per region. Rows are
    /// emitted subject-major, regions in the given order.
    pub fn from_wide<S, R>(subjects: &[S], regions: &[R], values: &Matrix) -> Result<Self>
    where
        S: AsRef<str>,
        R: AsRef<str>,
    {
        if values.shape() != (subjects.len(), regions.len()) {
            return Err(Error::InvalidParameter(format!(
                "wide table is {}x{} but {} subject(s) and {} region(s) were named",
                values.nrows(),
                values.ncols(),
                subjects.len(),
                regions.len()
            )));
        }

        let records = subjects.iter().enumerate().flat_map(|(i, subject)| {
            regions
                .iter()
                .enumerate()
                .map(move |(j, region)| Record::new(subject.as_ref(), region.as_ref(), values[(i, j)]))
        });
        Ok(Self::from_records(records))
    }

    /// Attach a per-row categorical column.
    pub fn with_column<S>(mut self, name: &str, values: Vec<S>) -> Result<Self>
    where
        S: Into<String>,
    {
        if values.len() != self.len() {
            return Err(Error::InvalidParameter(format!(
                "column '{name}' has {} value(s) for {} row(s)",
                values.len(),
                self.len()
            )));
        }
        self.columns
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        Ok(self)
    }

    /// Attach a column given one value per subject; every row of a subject
    /// receives that subject's value.
    pub fn with_subject_column<I, K, V>(self, name: &str, per_subject: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let lookup: HashMap<String, String> = per_subject
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let column = self
            .subjects
            .iter()
            .map(|s| {
                lookup
                    .get(s)
                    .cloned()
                    .ok_or_else(|| Error::UnknownSubject(s.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.with_column(name, column)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Subject of each row.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Region of each row.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Value of each row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// A categorical column by name.
    pub fn column(&self, name: &str) -> Result<&[String]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Names of the categorical columns.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Rows as `(subject, region, value)`.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = (&str, &str, f64)> + ExactSizeIterator {
        self.subjects
            .iter()
            .zip(&self.regions)
            .zip(&self.values)
            .map(|((s, r), v)| (s.as_str(), r.as_str(), *v))
    }

    /// Distinct subjects in order of first appearance.
    pub fn unique_subjects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.subjects
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Copy of the dataset with `column` rewritten from `labeling`.
    ///
    /// Each row takes its subject's label, so a subject's rows stay in one
    /// group. Row count and row order are unchanged.
    pub fn relabeled(&self, column: &str, labeling: &GroupLabeling) -> Result<Self> {
        let lookup: HashMap<&str, &str> = labeling.iter().collect();
        let relabeled = self
            .subjects
            .iter()
            .map(|s| {
                lookup
                    .get(s.as_str())
                    .map(|label| label.to_string())
                    .ok_or_else(|| Error::UnknownSubject(s.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = self.clone();
        out.columns.insert(column.to_string(), relabeled);
        Ok(out)
    }
}
