//! Subject → group label snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Dataset;
use crate::error::{Error, Result};

/// Immutable mapping of each unique subject to one group label.
///
/// The subject list is shared between the observed labeling and every
/// permuted labeling derived from it; only the label vector differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabeling {
    subjects: Arc<[String]>,
    labels: Vec<String>,
}

impl GroupLabeling {
    /// Pair subjects with labels position by position.
    pub fn new(subjects: Vec<String>, labels: Vec<String>) -> Result<Self> {
        if subjects.len() != labels.len() {
            return Err(Error::InvalidParameter(format!(
                "{} subject(s) but {} label(s)",
                subjects.len(),
                labels.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = subjects.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(Error::InvalidParameter(format!(
                "subject '{dup}' appears twice in labeling"
            )));
        }
        Ok(Self {
            subjects: subjects.into(),
            labels,
        })
    }

    /// The observed labeling of `dataset` under `column`.
    ///
    /// Subjects keep their order of first appearance. Fails with
    /// [`Error::InconsistentLabel`] if a subject's rows disagree.
    pub fn from_dataset(dataset: &Dataset, column: &str) -> Result<Self> {
        let column_values = dataset.column(column)?;

        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut subjects = Vec::new();
        let mut labels: Vec<String> = Vec::new();

        for (subject, label) in dataset.subjects().iter().zip(column_values) {
            match position.get(subject.as_str()) {
                Some(&idx) if labels[idx] != *label => {
                    return Err(Error::InconsistentLabel {
                        subject: subject.clone(),
                        first: labels[idx].clone(),
                        second: label.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    position.insert(subject.as_str(), subjects.len());
                    subjects.push(subject.clone());
                    labels.push(label.clone());
                }
            }
        }

        Ok(Self {
            subjects: subjects.into(),
            labels,
        })
    }

    /// Same subjects, new labels. Lengths must already agree.
    pub(crate) fn with_labels(&self, labels: Vec<String>) -> Self {
        debug_assert_eq!(labels.len(), self.subjects.len());
        Self {
            subjects: Arc::clone(&self.subjects),
            labels,
        }
    }

    /// Subjects in labeling order.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Labels, aligned with [`subjects`](Self::subjects).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no subjects.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(subject, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.subjects
            .iter()
            .zip(&self.labels)
            .map(|(s, l)| (s.as_str(), l.as_str()))
    }

    /// Label of one subject.
    pub fn label_of(&self, subject: &str) -> Option<&str> {
        self.iter().find(|(s, _)| *s == subject).map(|(_, l)| l)
    }

    /// Distinct labels in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.labels
            .iter()
            .filter(|l| seen.insert(l.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Number of subjects carrying each label.
    pub fn counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Subjects carrying `label`, in labeling order.
    pub fn subjects_in<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |(_, l)| *l == label).map(|(s, _)| s)
    }
}
