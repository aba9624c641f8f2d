//! Subject × region pivot of a long-form dataset.

use std::collections::{BTreeMap, HashMap};

use super::Dataset;
use crate::error::{Error, Result};
use crate::types::Matrix;

/// Wide table: one row per subject, one column per region.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    subjects: Vec<String>,
    regions: Vec<String>,
    values: Matrix,
}

impl WideTable {
    /// Wrap an existing subject × region matrix.
    pub fn new(subjects: Vec<String>, regions: Vec<String>, values: Matrix) -> Result<Self> {
        if values.shape() != (subjects.len(), regions.len()) {
            return Err(Error::InvalidParameter(format!(
                "wide table is {}x{} but {} subject(s) and {} region(s) were named",
                values.nrows(),
                values.ncols(),
                subjects.len(),
                regions.len()
            )));
        }
        Ok(Self {
            subjects,
            regions,
            values,
        })
    }

    /// Pivot a long-form dataset.
    ///
    /// Subjects and regions come out sorted, so two pivots of datasets sharing
    /// a region set have identical column order. Every subject must have
    /// exactly one value per region.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let subject_index = sorted_index(dataset.subjects());
        let region_index = sorted_index(dataset.regions());

        let mut values = Matrix::from_element(subject_index.len(), region_index.len(), f64::NAN);
        let mut filled = vec![false; subject_index.len() * region_index.len()];

        for (subject, region, value) in dataset.rows() {
            let i = subject_index[subject];
            let j = region_index[region];
            let slot = &mut filled[i * region_index.len() + j];
            if *slot {
                return Err(Error::DuplicateMeasurement {
                    subject: subject.to_string(),
                    region: region.to_string(),
                });
            }
            *slot = true;
            values[(i, j)] = value;
        }

        let subjects: Vec<String> = subject_index.keys().map(|s| s.to_string()).collect();
        let regions: Vec<String> = region_index.keys().map(|r| r.to_string()).collect();

        if let Some(missing) = filled.iter().position(|f| !f) {
            return Err(Error::IncompleteSubject {
                subject: subjects[missing / regions.len()].clone(),
                region: regions[missing % regions.len()].clone(),
            });
        }

        Ok(Self {
            subjects,
            regions,
            values,
        })
    }

    /// Subjects (row labels).
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Regions (column labels).
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Subject × region values.
    pub fn values(&self) -> &Matrix {
        &self.values
    }

    /// Number of subjects.
    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    /// Number of regions.
    pub fn n_regions(&self) -> usize {
        self.regions.len()
    }

    /// Row of `subject`, if present.
    pub fn row_of(&self, subject: &str) -> Option<usize> {
        self.subjects.iter().position(|s| s == subject)
    }

    /// Subject → row lookup table.
    pub fn row_index(&self) -> HashMap<&str, usize> {
        self.subjects
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect()
    }

    /// Sub-table with the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> WideTable {
        WideTable {
            subjects: rows.iter().map(|&i| self.subjects[i].clone()).collect(),
            regions: self.regions.clone(),
            values: self.values.select_rows(rows),
        }
    }
}

fn sorted_index(names: &[String]) -> BTreeMap<&str, usize> {
    let mut index: BTreeMap<&str, usize> = names.iter().map(|n| (n.as_str(), 0)).collect();
    for (i, slot) in index.values_mut().enumerate() {
        *slot = i;
    }
    index
}
