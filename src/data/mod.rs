//! Subject-level measurement data.
//!
//! - [`Dataset`]: long-form `(subject, region, value)` rows with named
//!   categorical columns such as a group label
//! - [`WideTable`]: the subject × region pivot fed to correlation
//! - [`GroupLabeling`]: the subject → group mapping that permutations shuffle

mod dataset;
mod labeling;
mod wide;

pub use dataset::{Dataset, Record};
pub use labeling::GroupLabeling;
pub use wide::WideTable;
