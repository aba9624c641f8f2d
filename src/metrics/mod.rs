//! Pluggable two-matrix statistics and their registry.
//!
//! A statistic compares two groups' covariance matrices and returns a
//! matrix-valued result whose shape is fixed for a given region count:
//! region × region, region × 1, or 1 × 1. The permutation runner treats
//! statistics as opaque and only relies on that shape being stable.

mod builtins;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{CovarianceMatrix, LabeledMatrix};

pub use builtins::{
    correlation_matrix_difference, degree_difference, frobenius_norm_difference,
    global_efficiency, global_efficiency_difference, strength_difference, weighted_degree,
};

/// A statistic comparing two index-aligned covariance matrices.
///
/// Implementations must be deterministic and must not depend on anything but
/// their inputs; the runner calls them concurrently from several threads.
pub trait Statistic: Send + Sync {
    /// Registry name, also reported in results.
    fn name(&self) -> &str;

    /// Compare group `a` against group `b`.
    fn compute(&self, a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix>;

    /// Output shape for matrices with `n_regions` regions, if known up front.
    ///
    /// `None` lets the runner infer the shape from the observed call.
    fn output_shape(&self, _n_regions: usize) -> Option<(usize, usize)> {
        None
    }
}

/// Adapter turning a closure into a [`Statistic`].
///
/// The closure may fail; its error aborts the run like any other statistic
/// error. Built-in functions such as [`frobenius_norm_difference`] can be
/// wrapped directly.
pub struct FnStatistic<F> {
    name: String,
    func: F,
}

impl<F> FnStatistic<F>
where
    F: Fn(&CovarianceMatrix, &CovarianceMatrix) -> Result<LabeledMatrix> + Send + Sync,
{
    /// Wrap `func` under `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Statistic for FnStatistic<F>
where
    F: Fn(&CovarianceMatrix, &CovarianceMatrix) -> Result<LabeledMatrix> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, a: &CovarianceMatrix, b: &CovarianceMatrix) -> Result<LabeledMatrix> {
        (self.func)(a, b)
    }
}

impl std::fmt::Debug for dyn Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statistic").field("name", &self.name()).finish()
    }
}

/// Name → statistic lookup table.
#[derive(Clone, Default)]
pub struct StatisticRegistry {
    entries: BTreeMap<String, Arc<dyn Statistic>>,
}

impl StatisticRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in statistics:
    ///
    /// | name | shape |
    /// |---|---|
    /// | `correlation_matrix_difference` | regions × regions |
    /// | `frobenius_norm_difference` | 1 × 1 |
    /// | `degree_difference` | regions × 1 |
    /// | `strength_difference` | regions × 1 |
    /// | `global_efficiency_difference` | 1 × 1 |
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for statistic in builtins::all() {
            registry.register(statistic);
        }
        registry
    }

    /// Add or replace a statistic under its own name.
    pub fn register(&mut self, statistic: Arc<dyn Statistic>) {
        self.entries.insert(statistic.name().to_string(), statistic);
    }

    /// Look up a statistic by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Statistic>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownStatistic(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registered statistics, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Statistic>> {
        self.entries.values()
    }

    /// Number of registered statistics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StatisticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
