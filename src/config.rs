//! Ledger configuration
//!
//! Protocol parameters the validator and block producer agree on.

use crate::crypto::MAX_DIFFICULTY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Issuance paid by every reward transaction
pub const BLOCK_REWARD: u64 = 50;

/// Default proof-of-work target (first 4 hash bytes, big-endian)
pub const DEFAULT_DIFFICULTY_TARGET: u32 = 0x00ff_ffff;

/// Default cap on nonce attempts for one mining run
pub const DEFAULT_MAX_MINING_ATTEMPTS: u64 = 50_000_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// What happens to the value a transaction leaves unassigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurplusPolicy {
    /// Surplus is destroyed; the reward pays exactly the issuance
    #[default]
    Forfeit,
    /// Surplus is added to the producer's reward output
    RewardProducer,
}

/// Chain-wide consensus parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Issuance amount of the reward transaction
    pub block_reward: u64,
    /// Highest accepted value of `difficulty_of(block.hash)`
    pub difficulty_target: u32,
    /// Handling of input value not spent by outputs
    pub surplus_policy: SurplusPolicy,
    /// Nonce attempts before the miner gives up
    pub max_mining_attempts: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            block_reward: BLOCK_REWARD,
            difficulty_target: DEFAULT_DIFFICULTY_TARGET,
            surplus_policy: SurplusPolicy::Forfeit,
            max_mining_attempts: DEFAULT_MAX_MINING_ATTEMPTS,
        }
    }
}

impl ChainConfig {
    /// Configuration that accepts any hash; useful for tests and local runs
    pub fn permissive() -> Self {
        Self {
            difficulty_target: MAX_DIFFICULTY,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_reward == 0 {
            return Err(ConfigError::Invalid("block_reward must be positive".into()));
        }
        if self.max_mining_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_mining_attempts must be positive".into(),
            ));
        }
        Ok(())
    }
}
