//! Subject-level label permutation.
//!
//! Permutations shuffle the unique subject → label mapping, never raw rows,
//! so all of a subject's measurements change group together. Each
//! permutation draws from its own random sub-stream derived from a root
//! seed, which makes the result independent of execution order.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::constants::GROUP_COUNT;
use crate::data::GroupLabeling;
use crate::error::{Error, Result};

/// Counter-based seed derivation using SplitMix64.
///
/// Maps `(base_seed, counter)` to a well-mixed 64-bit seed. Neighbouring
/// counters give unrelated seeds, so per-permutation generators are not
/// correlated with each other.
///
/// # Arguments
///
/// * `base_seed` - Root seed of the run
/// * `counter` - Permutation index (0, 1, 2, ...)
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64 finaliser, see https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Generator for permutation `index` of a run seeded with `root_seed`.
pub fn permutation_rng(root_seed: u64, index: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(root_seed, index as u64))
}

/// Draw a random permutation of a two-group labeling.
///
/// The label vector is shuffled uniformly (Fisher–Yates) while the subject
/// list stays put, so the number of subjects per label is exactly preserved.
///
/// # Arguments
///
/// * `labeling` - Observed subject → label mapping
/// * `rng` - Explicit generator; the same generator state gives the same labeling
///
/// # Errors
///
/// [`Error::InvalidGroupCount`] unless `labeling` has exactly two distinct labels.
pub fn permute_labels<R: Rng + ?Sized>(labeling: &GroupLabeling, rng: &mut R) -> Result<GroupLabeling> {
    let found = labeling.groups().len();
    if found != GROUP_COUNT {
        return Err(Error::InvalidGroupCount { found });
    }

    let mut labels = labeling.labels().to_vec();
    labels.shuffle(rng);
    Ok(labeling.with_labels(labels))
}
