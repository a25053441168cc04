//! # Node Configuration
//!
//! Unified configuration for the fork store, the token relay and the
//! ledger bootstrap.
//!
//! Loaded from an optional JSON file named by `ICP_CONFIG`, then overridden
//! field by field from `ICP_*` environment variables.

use std::path::Path;

use anyhow::{Context, Result};
use icp_01_light_client::LightClientConfig;
use icp_02_token_relay::RelayConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name, Symbol};
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Fork store configuration.
    pub light_client: LightClientConfig,
    /// Relay configuration.
    pub relay: RelayConfig,
    /// Account allowed to seed and reset the fork store.
    pub store_owner: Name,
    /// Native balances credited at startup.
    pub genesis_balances: Vec<GenesisBalance>,
    /// Wrapped tokens registered at startup.
    pub wrapped_tokens: Vec<WrappedToken>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            light_client: LightClientConfig::default(),
            relay: RelayConfig::default(),
            store_owner: Name::from_static("icp"),
            genesis_balances: Vec::new(),
            wrapped_tokens: Vec::new(),
        }
    }
}

/// A native balance credited at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    /// Token contract.
    pub contract: Name,
    /// Holder.
    pub account: Name,
    /// Amount.
    pub quantity: Asset,
}

/// A wrapped token for a peer-chain contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedToken {
    /// Origin contract on the peer chain.
    pub contract: Name,
    /// Token symbol.
    pub symbol: Symbol,
}

impl NodeConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            light_client: LightClientConfig::for_testing(),
            relay: RelayConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `ICP_*` overrides looked up through `var`.
    ///
    /// Malformed values are reported and skipped.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("ICP_MAX_BLOCKS") {
            match value.parse() {
                Ok(max) => self.light_client.max_blocks = max,
                Err(_) => warn!("ICP_MAX_BLOCKS must be a number, got {:?}", value),
            }
        }
        if let Some(value) = var("ICP_MAX_MERKLE_PATH_LEN") {
            match value.parse() {
                Ok(max) => self.light_client.max_merkle_path_len = max,
                Err(_) => warn!("ICP_MAX_MERKLE_PATH_LEN must be a number, got {:?}", value),
            }
        }
        override_name(&var, "ICP_STORE_OWNER", &mut self.store_owner);
        override_name(&var, "ICP_RELAY_ACCOUNT", &mut self.relay.relay_account);
        override_name(&var, "ICP_CHANNEL_ACCOUNT", &mut self.relay.channel_account);
        override_name(&var, "ICP_PEER_CHANNEL", &mut self.relay.peer_channel);
    }
}

fn override_name<F>(var: &F, key: &str, target: &mut Name)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = var(key) {
        match Name::new(value) {
            Ok(name) => *target = name,
            Err(e) => warn!("{} ignored: {}", key, e),
        }
    }
}

/// Load configuration from `ICP_CONFIG` (if set) and the environment.
pub fn load_config() -> Result<NodeConfig> {
    let mut config = match std::env::var("ICP_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            NodeConfig::from_file(Path::new(&path))?
        }
        Err(_) => NodeConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
