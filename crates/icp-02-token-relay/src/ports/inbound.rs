//! # Inbound Ports
//!
//! API trait defining what a relay endpoint can do.
//!
//! Each call is one atomic step: it either fully applies or returns an
//! error with every table and the ledger unchanged.

use shared_types::{Asset, Name};

use crate::domain::{IcpReceipt, LockResolution, ProvenAction, RelayError};

/// Token relay API - inbound port.
pub trait TokenRelayApi {
    /// Governance: fix the channel endpoints. Relay account only, once.
    fn set_peer_contracts(
        &mut self,
        caller: &Name,
        icp: Name,
        peer: Name,
    ) -> Result<(), RelayError>;

    /// Native transfer by `from`; a transfer into the relay account either
    /// relays (`"icp <to> <expiration>"` memo) or stages a deposit.
    ///
    /// Returns the packet sequence when a packet was sent.
    fn transfer(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Option<u64>, RelayError>;

    /// Relay a previously staged deposit to `icp_to` on the peer.
    #[allow(clippy::too_many_arguments)]
    fn relay_deposit(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError>;

    /// Burn wrapped tokens and send them back to their origin chain.
    #[allow(clippy::too_many_arguments)]
    fn refund(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError>;

    /// Apply a packet proven from the peer at peer-observed time `now`.
    ///
    /// `None` when the packet was already delivered.
    fn deliver_packet(
        &mut self,
        proven: &ProvenAction,
        now: u32,
    ) -> Result<Option<IcpReceipt>, RelayError>;

    /// Apply a receipt proven from the peer.
    ///
    /// `None` when the packet is unknown or already resolved.
    fn deliver_receipt(
        &mut self,
        proven: &ProvenAction,
    ) -> Result<Option<LockResolution>, RelayError>;

    /// Prune resolved packets and issued receipts by sequence.
    fn cleanup(&mut self, seqs: &[u64]) -> usize;
}
