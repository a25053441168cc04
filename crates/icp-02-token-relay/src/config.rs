//! # Token Relay Configuration
//!
//! Channel identities fixed at startup.

use serde::{Deserialize, Serialize};
use shared_types::Name;

use crate::domain::MAX_MEMO_LEN;

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Account holding locked assets; authorizes governance calls.
    pub relay_account: Name,

    /// Local packet channel account; the only caller of relay callbacks.
    pub channel_account: Name,

    /// Peer packet channel account whose proven actions are accepted.
    pub peer_channel: Name,

    /// Longest memo the relay forwards.
    pub max_memo_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_account: Name::from_static("icp.token"),
            channel_account: Name::from_static("icp"),
            peer_channel: Name::from_static("icp"),
            max_memo_len: MAX_MEMO_LEN,
        }
    }
}

impl RelayConfig {
    /// Create a config for testing (short memos).
    pub fn for_testing() -> Self {
        Self {
            max_memo_len: 32,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.relay_account.as_str(), "icp.token");
        assert_eq!(config.max_memo_len, 256);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{"relay_account": "bridge"}"#).unwrap();
        assert_eq!(config.relay_account.as_str(), "bridge");
        assert_eq!(config.peer_channel.as_str(), "icp");
    }
}
