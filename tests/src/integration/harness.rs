//! # Two-Chain Harness
//!
//! Chain A and chain B, each simulated block by block. Each side runs a relay
//! service whose fork store follows the *other* chain, so every event one
//! side emits reaches the other only as a proven action.
//!
//! ```text
//! A.service ──outbox──▶ chain A block ──headers──▶ B.peer_store
//!                            └──────proof──────▶ B.service.deliver_*
//! ```

use std::sync::Arc;

use icp_01_light_client::test_utils::ChainSimulator;
use icp_01_light_client::{
    Ed25519HeaderVerifier, ForkStore, LightClientApi, LightClientConfig,
};
use icp_02_token_relay::{
    ChannelEvent, ForkStoreVerifier, InMemoryTokenLedger, IcpReceipt, LockResolution,
    ProvenAction, RelayConfig, RelayError, RelayService, TokenRelayApi,
};
use parking_lot::RwLock;
use shared_types::{Asset, Name, Symbol};

/// Relay service as deployed on each side.
pub type Service = RelayService<InMemoryTokenLedger, ForkStoreVerifier<Ed25519HeaderVerifier>>;

/// Which chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Chain A, where alice holds native tokens.
    A,
    /// Chain B, where wrapped tokens are minted.
    B,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// One chain and the relay endpoint living on it.
pub struct Endpoint {
    /// The chain itself.
    pub chain: ChainSimulator,
    /// Relay service of this chain.
    pub service: Service,
    /// Light client following the other chain.
    pub peer_store: Arc<RwLock<ForkStore<Ed25519HeaderVerifier>>>,
    /// Highest block of the other chain fed into `peer_store`.
    synced: u32,
}

/// Result of carrying one event across.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// A packet was applied; the receiving side issued this receipt.
    Packet(Option<IcpReceipt>),
    /// A receipt resolved (or did not resolve) a lock.
    Receipt(Option<LockResolution>),
}

/// Both chains wired together.
pub struct TwoChains {
    /// Chain A.
    pub a: Endpoint,
    /// Chain B.
    pub b: Endpoint,
}

/// Account name.
pub fn name(s: &str) -> Name {
    Name::new(s).expect("valid name")
}

/// EOS amount in smallest units.
pub fn eos(amount: i64) -> Asset {
    Asset::new(amount, eos_symbol()).expect("valid asset")
}

/// `4,EOS`.
pub fn eos_symbol() -> Symbol {
    Symbol::new(4, "EOS").expect("valid symbol")
}

/// Token contract on both chains.
pub fn token() -> Name {
    name("eosio.token")
}

/// Relay account on both chains.
pub fn relay_account() -> Name {
    name("icp.token")
}

/// Channel account on both chains.
pub fn channel_account() -> Name {
    name("icp")
}

fn endpoint(chain: ChainSimulator, peer: &ChainSimulator) -> Endpoint {
    let owner = channel_account();
    let config = LightClientConfig::default();
    let mut store = ForkStore::new(owner.clone(), Ed25519HeaderVerifier, config);
    store
        .init_seed(&owner, peer.genesis().clone())
        .expect("seed peer genesis");
    let peer_store = Arc::new(RwLock::new(store));

    let mut ledger = InMemoryTokenLedger::default();
    ledger
        .issue(&token(), &name("alice"), &eos(1_000_000))
        .expect("fund alice");
    ledger.create(&token(), &eos_symbol()).expect("wrapped EOS");
    let mut service = RelayService::new(
        RelayConfig::default(),
        ledger,
        ForkStoreVerifier::new(Arc::clone(&peer_store)),
    );
    service
        .set_peer_contracts(&relay_account(), channel_account(), relay_account())
        .expect("peer contracts");

    Endpoint {
        chain,
        service,
        peer_store,
        synced: 1,
    }
}

impl TwoChains {
    /// Single-producer chains: every block is irreversible at once.
    pub fn new() -> Self {
        Self::with_producers(&["alpha"], &["alpha"])
    }

    /// Chains with the given producer sets.
    pub fn with_producers(a: &[&str], b: &[&str]) -> Self {
        let chain_a = ChainSimulator::new(a);
        let chain_b = ChainSimulator::new(b);
        let b_end = endpoint(chain_b.clone(), &chain_a);
        let a_end = endpoint(chain_a, &chain_b);
        Self { a: a_end, b: b_end }
    }

    /// Endpoint by side.
    pub fn side(&mut self, side: Side) -> &mut Endpoint {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    fn pair(&mut self, from: Side) -> (&mut Endpoint, &mut Endpoint) {
        match from {
            Side::A => (&mut self.a, &mut self.b),
            Side::B => (&mut self.b, &mut self.a),
        }
    }

    /// Record `from`'s outbox on its chain, finalize it, and prove each event
    /// to the other side. Returns the proven events in emission order.
    pub fn publish(&mut self, from: Side) -> Vec<ProvenAction> {
        let (src, dst) = self.pair(from);
        let events = src.service.drain_outbox();
        let receipts: Vec<_> = events
            .iter()
            .map(|event| {
                let action = event.encode().expect("encode event");
                let receipt = src.chain.push_action(&channel_account(), &action);
                (action, receipt)
            })
            .collect();
        let block = src.chain.produce_block().block_num();
        src.chain.produce_until_irreversible(block + 1);

        let head = src.chain.head().block_num;
        {
            let mut store = dst.peer_store.write();
            for num in dst.synced + 1..=head {
                let header = src.chain.header(num).expect("produced header").clone();
                store.add_header(header).expect("peer header links");
            }
        }
        dst.synced = head;

        let anchor = dst.peer_store.read().last_irreversible_blocknum();
        receipts
            .into_iter()
            .map(|(action, receipt)| ProvenAction {
                proof: src
                    .chain
                    .prove_action(&receipt, anchor)
                    .expect("action is provable"),
                action,
                receipt,
            })
            .collect()
    }

    /// Hand one proven event to `to` at peer-observed time `now`.
    pub fn deliver(
        &mut self,
        to: Side,
        proven: &ProvenAction,
        now: u32,
    ) -> Result<Delivery, RelayError> {
        let service = &mut self.side(to).service;
        match ChannelEvent::decode(&proven.action)? {
            ChannelEvent::Packet(_) => service.deliver_packet(proven, now).map(Delivery::Packet),
            ChannelEvent::Receipt(_) => service.deliver_receipt(proven).map(Delivery::Receipt),
        }
    }

    /// Publish everything `from` emitted and deliver it to the other side.
    pub fn relay(&mut self, from: Side, now: u32) -> Vec<Result<Delivery, RelayError>> {
        let proven = self.publish(from);
        proven
            .iter()
            .map(|p| self.deliver(from.other(), p, now))
            .collect()
    }

    /// Native EOS balance on a side.
    pub fn native(&mut self, side: Side, account: &str) -> i64 {
        self.side(side)
            .service
            .relay()
            .ledger()
            .balance(&token(), &name(account), &eos_symbol())
    }

    /// Wrapped EOS balance on a side.
    pub fn wrapped(&mut self, side: Side, account: &str) -> i64 {
        self.side(side)
            .service
            .relay()
            .ledger()
            .wrapped_balance(&token(), &name(account), &eos_symbol())
    }

    /// Alice sends `amount` from A to `to` on B with the relay memo.
    pub fn send_from_a(&mut self, amount: i64, to: &str, expiration: u32) -> u64 {
        let (alice, memo) = (name("alice"), format!("icp {to} {expiration}"));
        self.a
            .service
            .transfer(&alice, &token(), &alice, &relay_account(), &eos(amount), &memo)
            .expect("relay transfer")
            .expect("packet sent")
    }
}

impl Default for TwoChains {
    fn default() -> Self {
        Self::new()
    }
}
