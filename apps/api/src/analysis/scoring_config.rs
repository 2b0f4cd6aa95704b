use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::errors::ConfigurationError;

/// Weights, thresholds and cutoffs for one deployment. Every field can be
/// overridden from JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub must_have_weight: f64,
    pub nice_to_have_weight: f64,
    /// Minimum normalized string similarity for a Fuzzy signal.
    pub fuzzy_threshold: f32,
    /// Minimum provider similarity for a Semantic signal.
    pub semantic_threshold: f32,
    /// Scores at or above this are High.
    pub high_cutoff: u8,
    /// Scores at or above this (and below `high_cutoff`) are Medium.
    pub medium_cutoff: u8,
    /// Upper bound on the semantic pass of one evaluation.
    pub provider_timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            must_have_weight: 2.0,
            nice_to_have_weight: 1.0,
            fuzzy_threshold: 0.8,
            semantic_threshold: 0.65,
            high_cutoff: 75,
            medium_cutoff: 50,
            provider_timeout_ms: 3_000,
        }
    }
}

impl ScoringConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, weight) in [
            ("must_have_weight", self.must_have_weight),
            ("nice_to_have_weight", self.nice_to_have_weight),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigurationError::Scoring(format!(
                    "{name} must be a positive number, got {weight}"
                )));
            }
        }

        for (name, threshold) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("semantic_threshold", self.semantic_threshold),
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigurationError::Scoring(format!(
                    "{name} must be within [0, 1], got {threshold}"
                )));
            }
        }

        if self.high_cutoff > 100 || self.medium_cutoff > self.high_cutoff {
            return Err(ConfigurationError::Scoring(format!(
                "verdict cutoffs must satisfy medium <= high <= 100, got medium={} high={}",
                self.medium_cutoff, self.high_cutoff
            )));
        }

        if self.provider_timeout_ms == 0 {
            return Err(ConfigurationError::Scoring(
                "provider_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigurationError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), ?config, "loaded scoring configuration");
        Ok(config)
    }
}
