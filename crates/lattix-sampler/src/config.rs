//! Sampler configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration shared by the training builders and loaders.
///
/// # Example
///
/// ```rust
/// use lattix_sampler::SamplerConfig;
///
/// let config = SamplerConfig::default()
///     .with_negative_sample_size(64)
///     .with_pair_sample_size(8)
///     .with_batch_size(128);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Entity negatives per positive fact (default: 128).
    pub negative_sample_size: usize,
    /// Positive and negative entity pairs per fact (default: 16).
    pub pair_sample_size: usize,
    /// Examples per batch (default: 512).
    pub batch_size: usize,
    /// Starting count for every (entity, relation) frequency (default: 4).
    pub frequency_floor: u32,
    /// Cap on rejection-sampling rounds (default: None = retry forever).
    ///
    /// Setting a cap changes the output distribution on pathological inputs:
    /// a capped loop fails with [`Error::SamplingExhausted`] instead of
    /// eventually succeeding.
    pub max_rejection_rounds: Option<usize>,
    /// Shuffle example order each epoch (default: true).
    pub shuffle: bool,
    /// Random seed (default: 42).
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            negative_sample_size: 128,
            pair_sample_size: 16,
            batch_size: 512,
            frequency_floor: 4,
            max_rejection_rounds: None,
            shuffle: true,
            seed: 42,
        }
    }
}

impl SamplerConfig {
    pub fn with_negative_sample_size(mut self, n: usize) -> Self {
        self.negative_sample_size = n;
        self
    }

    pub fn with_pair_sample_size(mut self, n: usize) -> Self {
        self.pair_sample_size = n;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_frequency_floor(mut self, floor: u32) -> Self {
        self.frequency_floor = floor;
        self
    }

    pub fn with_max_rejection_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_rejection_rounds = rounds;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check values that would make sampling meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.frequency_floor == 0 {
            return Err(Error::InvalidConfig("frequency_floor must be > 0".into()));
        }
        if self.max_rejection_rounds == Some(0) {
            return Err(Error::InvalidConfig(
                "max_rejection_rounds must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SamplerConfig::default()
            .with_negative_sample_size(32)
            .with_pair_sample_size(4)
            .with_seed(7)
            .with_max_rejection_rounds(Some(100));

        assert_eq!(config.negative_sample_size, 32);
        assert_eq!(config.pair_sample_size, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_rejection_rounds, Some(100));
        assert_eq!(config.frequency_floor, 4);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = SamplerConfig::default().with_batch_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let config = SamplerConfig::default().with_max_rejection_rounds(Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config =
            SamplerConfig::from_json_str(r#"{"negative_sample_size": 8, "shuffle": false}"#)
                .unwrap();
        assert_eq!(config.negative_sample_size, 8);
        assert!(!config.shuffle);
        assert_eq!(config.batch_size, 512);
        assert_eq!(config.max_rejection_rounds, None);
    }

    #[test]
    fn test_from_json_validates() {
        let err = SamplerConfig::from_json_str(r#"{"batch_size": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        let err = SamplerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
