//! # Light Client Configuration
//!
//! Configuration for the fork store.

use serde::{Deserialize, Serialize};

/// Fork store configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightClientConfig {
    /// Cap on retained block records before oldest-first eviction.
    pub max_blocks: u32,

    /// Longest id path accepted by a catch-up submission.
    pub max_merkle_path_len: usize,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            max_blocks: 100_000,
            max_merkle_path_len: 1 << 20,
        }
    }
}

impl LightClientConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            max_blocks: 64,
            max_merkle_path_len: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LightClientConfig::default();
        assert_eq!(config.max_blocks, 100_000);
    }

    #[test]
    fn test_testing_config() {
        let config = LightClientConfig::for_testing();
        assert_eq!(config.max_blocks, 64);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: LightClientConfig = serde_json::from_str(r#"{"max_blocks": 10}"#).unwrap();
        assert_eq!(config.max_blocks, 10);
        assert_eq!(config.max_merkle_path_len, 1 << 20);
    }
}
