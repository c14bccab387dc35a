// 7.0 config.rs: engine settings in one place. event retention, market shape limits, logging.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    // Maximum number of events to retain in memory
    pub max_events: usize,
    // Upper bound on options a single market may carry
    pub max_options_per_market: usize,
    // Maximum byte length of a description or option name
    pub max_label_len: usize,
    // Log every emitted event at debug level
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            max_options_per_market: 64,
            max_label_len: 256,
            verbose: false,
        }
    }
}

impl EngineConfig {
    // Local runs: keep everything, log everything
    pub fn development() -> Self {
        Self {
            max_events: 1_000_000,
            verbose: true,
            ..Self::default()
        }
    }

    // Tighter shape limits for public deployments
    pub fn strict() -> Self {
        Self {
            max_events: 10_000,
            max_options_per_market: 16,
            max_label_len: 64,
            verbose: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::InvalidRetention {
                reason: "max_events must be at least 1".to_string(),
            });
        }

        if self.max_options_per_market == 0 {
            return Err(ConfigError::InvalidMarketShape {
                reason: "markets need at least one option".to_string(),
            });
        }

        if self.max_label_len == 0 {
            return Err(ConfigError::InvalidMarketShape {
                reason: "labels need at least one byte".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid event retention: {reason}")]
    InvalidRetention { reason: String },

    #[error("Invalid market shape limits: {reason}")]
    InvalidMarketShape { reason: String },
}
