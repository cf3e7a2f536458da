//! Configuration for the ledger

use serde::Deserialize;
use thiserror::Error;

use std::fs;
use std::path::Path;

use crate::blockchain::{MINING_DIFFICULTY, MINING_REWARD};

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "POW_LEDGER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Chain parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Leading zero hex digits required in a block hash
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    /// Amount credited to the miner per block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,

    /// Give up mining after this many nonces; unbounded when absent
    #[serde(default)]
    pub max_nonce_attempts: Option<u64>,

    /// Reject transfers the sender's chain balance cannot cover
    #[serde(default)]
    pub enforce_balance: bool,
}

fn default_difficulty() -> usize {
    MINING_DIFFICULTY
}

fn default_mining_reward() -> f64 {
    MINING_REWARD
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
            max_nonce_attempts: None,
            enforce_balance: false,
        }
    }
}

impl ChainConfig {
    /// Parses and validates a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ChainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Loads the file named by `POW_LEDGER_CONFIG`, or the defaults when unset
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > 64 {
            return Err(ConfigError::Invalid(format!(
                "difficulty must be between 1 and 64, got {}",
                self.difficulty
            )));
        }

        if !self.mining_reward.is_finite() || self.mining_reward <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mining_reward must be a positive number, got {}",
                self.mining_reward
            )));
        }

        if self.max_nonce_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_nonce_attempts must be greater than zero".to_string(),
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
        let config = ChainConfig::default();

        assert_eq!(config.difficulty, 3);
        assert_eq!(config.mining_reward, 1.0);
        assert_eq!(config.max_nonce_attempts, None);
        assert!(!config.enforce_balance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ChainConfig::from_json_str(r#"{"difficulty": 2}"#).unwrap();

        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, MINING_REWARD);

        let empty = ChainConfig::from_json_str("{}").unwrap();
        assert_eq!(empty, ChainConfig::default());
    }

    #[test]
    fn test_full_json() {
        let config = ChainConfig::from_json_str(
            r#"{"difficulty": 4, "mining_reward": 12.5, "max_nonce_attempts": 1000000, "enforce_balance": true}"#,
        )
        .unwrap();

        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 12.5);
        assert_eq!(config.max_nonce_attempts, Some(1_000_000));
        assert!(config.enforce_balance);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"difficulty": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"difficulty": 65}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"mining_reward": -1.0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"max_nonce_attempts": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"difficulty": "three"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ChainConfig::from_json_str(r#"{"reward": 1.0}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let result = ChainConfig::from_file("/nonexistent/pow_ledger/config.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
