//! Progressive pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest side length any tier may reach.
pub const MAX_RESOLUTION: u32 = 16384;
/// Largest number of tiers in one ladder.
pub const MAX_TIERS: u32 = 16;

/// Errors raised when a pipeline configuration cannot produce a ladder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_resolution must be at least 1")]
    ZeroBaseResolution,
    #[error("quality_tier must be at least 1")]
    ZeroQualityTier,
    #[error("tier_count must be in 1..={max}, got {0}", max = MAX_TIERS)]
    TierCount(u32),
    #[error("top tier resolution {0} exceeds {max}", max = MAX_RESOLUTION)]
    ResolutionTooLarge(u64),
}

/// Parameters for the resolution ladder, retries and buffer retirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Resolution of the first tier before quality scaling.
    pub base_resolution: u32,
    /// Number of tiers; each doubles the previous resolution.
    pub tier_count: u32,
    /// Multiplier applied to every tier (1 = 256/512/1024).
    pub quality_tier: u32,
    /// How long a superseded buffer set stays alive for cross-fading.
    pub retire_delay: Duration,
    /// A tier still running after this long counts as failed.
    pub task_timeout: Duration,
    /// Extra attempts for a failed tier before giving up.
    pub max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_resolution: 256,
            tier_count: 3,
            quality_tier: 1,
            retire_delay: Duration::from_secs(2),
            task_timeout: Duration::from_secs(60),
            max_retries: 1,
        }
    }
}

impl PipelineConfig {
    /// Small ladder for quick previews (32/64/128).
    pub fn preview() -> Self {
        Self {
            base_resolution: 32,
            ..Default::default()
        }
    }

    /// Resolutions visited by one run, strictly increasing.
    pub fn resolutions(&self) -> Vec<u32> {
        (0..self.tier_count)
            .map(|i| self.base_resolution * self.quality_tier * (1 << i))
            .collect()
    }

    /// Checks that the ladder is non-empty and its top tier stays within [`MAX_RESOLUTION`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_resolution == 0 {
            return Err(ConfigError::ZeroBaseResolution);
        }
        if self.quality_tier == 0 {
            return Err(ConfigError::ZeroQualityTier);
        }
        if self.tier_count == 0 || self.tier_count > MAX_TIERS {
            return Err(ConfigError::TierCount(self.tier_count));
        }
        let top = (self.base_resolution as u64)
            * (self.quality_tier as u64)
            * (1u64 << (self.tier_count - 1));
        if top > MAX_RESOLUTION as u64 {
            return Err(ConfigError::ResolutionTooLarge(top));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder() {
        let config = PipelineConfig::default();
        assert_eq!(config.resolutions(), vec![256, 512, 1024]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quality_scales_ladder() {
        let config = PipelineConfig {
            quality_tier: 2,
            ..Default::default()
        };
        assert_eq!(config.resolutions(), vec![512, 1024, 2048]);
    }

    #[test]
    fn test_validate_rejects_bad_ladders() {
        let zero = PipelineConfig {
            tier_count: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::TierCount(0)));

        let huge = PipelineConfig {
            quality_tier: 64,
            ..Default::default()
        };
        assert_eq!(huge.validate(), Err(ConfigError::ResolutionTooLarge(65536)));

        let empty = PipelineConfig {
            base_resolution: 0,
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::ZeroBaseResolution));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = PipelineConfig::preview();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
