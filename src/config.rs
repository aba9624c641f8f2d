//! Configuration for permutation tests.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PERMUTATIONS;
use crate::error::{Error, Result};
use crate::types::CorrelationMethod;

/// Configuration options for a permutation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Correlation method for the group connectomes (default: Pearson).
    pub method: CorrelationMethod,

    /// Number of label permutations (default: 1,000).
    pub n_permutations: usize,

    /// Keep every null statistic in the result (default: false).
    pub return_distribution: bool,

    /// Keep every permuted labeling in the result for auditing (default: true).
    pub keep_label_history: bool,

    /// Root seed for the permutation sub-streams.
    ///
    /// `None` draws a fresh seed per run; the drawn value is reported in the
    /// result metadata so the run can be repeated.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: CorrelationMethod::Pearson,
            n_permutations: DEFAULT_PERMUTATIONS,
            return_distribution: false,
            keep_label_history: true,
            seed: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::InvalidParameter(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a p-value.
    pub fn validate(&self) -> Result<()> {
        if self.n_permutations == 0 {
            return Err(Error::InvalidParameter(
                "n_permutations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.method, CorrelationMethod::Pearson);
        assert_eq!(config.n_permutations, 1000);
        assert!(!config.return_distribution);
        assert!(config.keep_label_history);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = Config::from_json(r#"{"method": "kendall", "seed": 7}"#).unwrap();
        assert_eq!(config.method, CorrelationMethod::Kendall);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.n_permutations, 1000);
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let err = Config::from_json(r#"{"n_permutations": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(Config::from_json("{\"method\": \"cosine\"}").is_err());
    }
}
