//! # Outbound Ports
//!
//! Collaborators the relay depends on: the token ledger, the light client
//! that checks peer-chain proofs, and the transport that carries outbox
//! events to the peer.

use std::sync::Arc;

use async_trait::async_trait;
use icp_01_light_client::InclusionProof;
use parking_lot::Mutex;
use shared_types::{Asset, Name};

use crate::domain::{ChannelEvent, LedgerError, RelayError};

/// Token ledger - outbound port.
///
/// `transfer` moves native tokens of `contract`; `mint` and `burn` act on
/// the relay's wrapped books for tokens originating from peer `contract`.
/// The relay is the sole caller of `mint` and `burn`.
pub trait TokenLedger: Send + Sync {
    /// Move native tokens.
    fn transfer(
        &mut self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError>;

    /// Credit wrapped tokens, growing their supply.
    fn mint(&mut self, contract: &Name, to: &Name, quantity: &Asset) -> Result<(), LedgerError>;

    /// Debit wrapped tokens, shrinking their supply.
    fn burn(&mut self, contract: &Name, from: &Name, quantity: &Asset) -> Result<(), LedgerError>;
}

/// Peer-chain proof check - outbound port.
///
/// Production: `ForkStoreVerifier` (adapters)
/// Testing: `MockInclusionVerifier` (below)
pub trait InclusionVerifier: Send + Sync {
    /// Accept `proof` only if it reaches an irreversible peer block.
    fn verify(&self, proof: &InclusionProof) -> Result<(), RelayError>;
}

/// Outbox delivery - outbound port.
///
/// At-most-once enqueue per call; peer-side delivery is settled by the
/// receipt protocol, not by the transport.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Hand one channel event to the relayer.
    async fn deliver(&self, event: ChannelEvent) -> Result<(), RelayError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock verifier returning a fixed answer.
#[derive(Clone, Copy, Debug)]
pub struct MockInclusionVerifier {
    /// Accept every proof?
    pub accept: bool,
}

impl Default for MockInclusionVerifier {
    fn default() -> Self {
        Self { accept: true }
    }
}

impl InclusionVerifier for MockInclusionVerifier {
    fn verify(&self, _proof: &InclusionProof) -> Result<(), RelayError> {
        if self.accept {
            Ok(())
        } else {
            Err(RelayError::Proof(
                icp_01_light_client::LightClientError::InvalidBlockProof,
            ))
        }
    }
}

/// Mock transport collecting delivered events.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    /// Delivered events, in order.
    pub delivered: Arc<Mutex<Vec<ChannelEvent>>>,
    /// Fail after this many deliveries, if set.
    pub fail_after: Option<usize>,
}

impl MockTransport {
    /// Events delivered so far.
    pub fn events(&self) -> Vec<ChannelEvent> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl RelayTransport for MockTransport {
    async fn deliver(&self, event: ChannelEvent) -> Result<(), RelayError> {
        let mut delivered = self.delivered.lock();
        if self.fail_after.is_some_and(|limit| delivered.len() >= limit) {
            return Err(RelayError::Transport("mock transport closed".into()));
        }
        delivered.push(event);
        Ok(())
    }
}
