//! # Node Runtime
//!
//! Owns the fork store and the relay service and routes each command to
//! the one handler that applies it.

use std::sync::Arc;

use icp_01_light_client::{
    Ed25519HeaderVerifier, ForkStore, LightClientApi, LightClientError, StoredBlock,
};
use icp_02_token_relay::{
    ForkStoreVerifier, InMemoryTokenLedger, LedgerError, RelayError, RelayService,
    RelayTransport, TokenRelayApi,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::commands::{Command, Response};
use crate::config::NodeConfig;

/// Fork store tracking the peer chain.
pub type PeerStore = ForkStore<Ed25519HeaderVerifier>;

/// Relay service settling against the in-memory ledger.
pub type NodeRelay = RelayService<InMemoryTokenLedger, ForkStoreVerifier<Ed25519HeaderVerifier>>;

/// Command handling errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Fork store rejected the command.
    #[error("light client: {0}")]
    LightClient(#[from] LightClientError),

    /// Relay rejected the command.
    #[error("relay: {0}")]
    Relay(#[from] RelayError),

    /// Ledger bootstrap failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

/// One relay endpoint.
pub struct NodeRuntime {
    store: Arc<RwLock<PeerStore>>,
    relay: NodeRelay,
}

impl NodeRuntime {
    /// Build the store and relay, crediting the configured genesis balances.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let store = Arc::new(RwLock::new(ForkStore::new(
            config.store_owner.clone(),
            Ed25519HeaderVerifier,
            config.light_client.clone(),
        )));

        let mut ledger = InMemoryTokenLedger::default();
        for balance in &config.genesis_balances {
            ledger.issue(&balance.contract, &balance.account, &balance.quantity)?;
        }
        for token in &config.wrapped_tokens {
            ledger.create(&token.contract, &token.symbol)?;
        }
        info!(
            "Relay node ready: relay={} channel={} peer={} ({} balances, {} wrapped tokens)",
            config.relay.relay_account,
            config.relay.channel_account,
            config.relay.peer_channel,
            config.genesis_balances.len(),
            config.wrapped_tokens.len()
        );

        let relay = RelayService::new(
            config.relay,
            ledger,
            ForkStoreVerifier::new(Arc::clone(&store)),
        );
        Ok(Self { store, relay })
    }

    /// Shared fork store.
    pub fn store(&self) -> &Arc<RwLock<PeerStore>> {
        &self.store
    }

    /// Relay service.
    pub fn relay(&self) -> &NodeRelay {
        &self.relay
    }

    /// Apply one command and shape its result line.
    pub fn handle(&mut self, command: Command) -> Response {
        match self.apply(command) {
            Ok(result) => Response::ok(result),
            Err(e) => Response::error(e),
        }
    }

    /// Deliver the outbox through `transport`.
    pub async fn flush<T: RelayTransport>(&mut self, transport: &T) -> Result<usize, RelayError> {
        self.relay.flush_outbox(transport).await
    }

    fn apply(&mut self, command: Command) -> Result<Value, NodeError> {
        match command {
            Command::InitSeed { caller, state } => {
                self.store.write().init_seed(&caller, *state)?;
                Ok(self.status())
            }
            Command::AddHeader { header } => {
                let id = self.store.write().add_header(header)?;
                Ok(json!({ "id": hex::encode(id), "status": self.status() }))
            }
            Command::AddHeaderWithMerklePath { state, merkle_path } => {
                let id = self
                    .store
                    .write()
                    .add_header_with_merkle_path(*state, merkle_path)?;
                Ok(json!({ "id": hex::encode(id), "status": self.status() }))
            }
            Command::Reset {
                caller,
                clear_all,
                max_blocks,
            } => {
                self.store.write().reset(&caller, clear_all, max_blocks)?;
                Ok(self.status())
            }
            Command::Status => Ok(self.status()),
            Command::BlockByNum { block_num } => {
                let block = self.store.read().block_by_num(block_num)?;
                Ok(block_json(&block))
            }
            Command::SetPeerContracts { caller, icp, peer } => {
                self.relay.set_peer_contracts(&caller, icp, peer)?;
                Ok(Value::Null)
            }
            Command::Transfer {
                caller,
                contract,
                from,
                to,
                quantity,
                memo,
            } => {
                let seq = self
                    .relay
                    .transfer(&caller, &contract, &from, &to, &quantity, &memo)?;
                Ok(json!({ "seq": seq }))
            }
            Command::RelayDeposit {
                caller,
                contract,
                from,
                icp_to,
                quantity,
                memo,
                expiration,
            } => {
                let seq = self.relay.relay_deposit(
                    &caller, &contract, &from, &icp_to, &quantity, &memo, expiration,
                )?;
                Ok(json!({ "seq": seq }))
            }
            Command::Refund {
                caller,
                contract,
                from,
                icp_to,
                quantity,
                memo,
                expiration,
            } => {
                let seq = self
                    .relay
                    .refund(&caller, &contract, &from, &icp_to, &quantity, &memo, expiration)?;
                Ok(json!({ "seq": seq }))
            }
            Command::DeliverPacket { proven, now } => {
                let receipt = self.relay.deliver_packet(&proven, now)?;
                Ok(json!({
                    "receipt": receipt.map(|r| json!({
                        "seq": r.seq,
                        "pseq": r.pseq,
                        "status": format!("{:?}", r.status),
                    }))
                }))
            }
            Command::DeliverReceipt { proven } => {
                let resolution = self.relay.deliver_receipt(&proven)?;
                Ok(json!({ "resolution": resolution.map(|r| format!("{r:?}")) }))
            }
            Command::Cleanup { seqs } => Ok(json!({ "removed": self.relay.cleanup(&seqs) })),
            Command::Balance {
                contract,
                account,
                symbol,
            } => {
                let ledger = self.relay.relay().ledger();
                Ok(json!({
                    "native": ledger.balance(&contract, &account, &symbol),
                    "wrapped": ledger.wrapped_balance(&contract, &account, &symbol),
                }))
            }
        }
    }

    fn status(&self) -> Value {
        let store = self.store.read();
        match store.head() {
            Some(head) => json!({
                "head": head.block_num,
                "head_id": hex::encode(head.id),
                "lib": head.last_irreversible_blocknum(),
                "blocks": store.meter().current_blocks,
            }),
            None => json!({ "head": null, "lib": 0 }),
        }
    }
}

fn block_json(block: &StoredBlock) -> Value {
    json!({
        "block_num": block.block_num,
        "id": hex::encode(block.id),
        "action_mroot": block.action_mroot.map(hex::encode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use icp_01_light_client::test_utils::ChainSimulator;
    use shared_types::{Name, Symbol};

    use crate::config::GenesisBalance;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn create_test_runtime() -> NodeRuntime {
        let mut config = NodeConfig::for_testing();
        config.genesis_balances.push(GenesisBalance {
            contract: name("eosio.token"),
            account: name("alice"),
            quantity: "100.0000 EOS".parse().unwrap(),
        });
        NodeRuntime::new(config).unwrap()
    }

    #[test]
    fn test_seed_and_follow_peer() {
        let mut node = create_test_runtime();
        let mut chain = ChainSimulator::new(&["alpha"]);
        chain.produce_blocks(2);

        let response = node.handle(Command::InitSeed {
            caller: name("icp"),
            state: Box::new(chain.genesis().clone()),
        });
        assert!(response.ok, "{:?}", response.error);

        for num in 2..=3 {
            let header = chain.header(num).unwrap().clone();
            assert!(node.handle(Command::AddHeader { header }).ok);
        }
        let status = node.handle(Command::Status).result.unwrap();
        assert_eq!(status["head"], 3);
        assert_eq!(status["lib"], 3);

        let block = node.handle(Command::BlockByNum { block_num: 2 }).result.unwrap();
        assert_eq!(block["id"], hex::encode(chain.state(2).unwrap().id));
    }

    #[test]
    fn test_rejections_are_reported() {
        let mut node = create_test_runtime();
        let chain = ChainSimulator::new(&["alpha"]);
        let response = node.handle(Command::InitSeed {
            caller: name("mallory"),
            state: Box::new(chain.genesis().clone()),
        });
        assert!(!response.ok);
        assert!(response.error.unwrap().starts_with("light client:"));
    }

    #[test]
    fn test_transfer_and_balance() {
        let mut node = create_test_runtime();
        assert!(node
            .handle(Command::SetPeerContracts {
                caller: name("icp.token"),
                icp: name("icp"),
                peer: name("icp.token"),
            })
            .ok);
        let response = node.handle(Command::Transfer {
            caller: name("alice"),
            contract: name("eosio.token"),
            from: name("alice"),
            to: name("icp.token"),
            quantity: "10.0000 EOS".parse().unwrap(),
            memo: "icp bob 100".into(),
        });
        assert_eq!(response.result.unwrap()["seq"], 1);

        let balance = node
            .handle(Command::Balance {
                contract: name("eosio.token"),
                account: name("alice"),
                symbol: Symbol::new(4, "EOS").unwrap(),
            })
            .result
            .unwrap();
        assert_eq!(balance["native"], 900_000);
        assert_eq!(node.relay().channel().outbox_len(), 1);
    }
}
