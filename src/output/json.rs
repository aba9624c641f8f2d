//! JSON serialization for permutation test results.

use crate::result::PermutationResult;

/// Serialize a PermutationResult to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails. NaN cells are written as `null`.
pub fn to_json(result: &PermutationResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize a PermutationResult to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(result: &PermutationResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}
