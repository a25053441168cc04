//! # Relay Service
//!
//! One relay endpoint: packet channel, lock manager, token ledger and the
//! light client that vouches for the peer.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `TokenRelayApi` for user, governance and relayer calls
//! 2. Accepts peer events only as `ProvenAction`s bound to the peer channel
//!    and checked by the `InclusionVerifier` port
//! 3. Dispatches proven packets into `TokenRelay::on_inbound_transfer` and
//!    proven receipts into `TokenRelay::on_receipt`
//! 4. Hands outbox events to a `RelayTransport`

use shared_types::{Asset, Name};
use tracing::{debug, warn};

use super::channel::PacketChannel;
use super::relay::TokenRelay;
use crate::algorithms::check_action_binding;
use crate::config::RelayConfig;
use crate::domain::{
    ChannelEvent, IcpReceipt, LockResolution, OutboundAction, ProvenAction, RelayAction,
    RelayError,
};
use crate::ports::{InclusionVerifier, RelayTransport, TokenLedger, TokenRelayApi};

/// Relay endpoint service.
pub struct RelayService<L: TokenLedger, V: InclusionVerifier> {
    config: RelayConfig,
    channel: PacketChannel,
    relay: TokenRelay<L>,
    verifier: V,
}

impl<L: TokenLedger, V: InclusionVerifier> RelayService<L, V> {
    /// Create a service over `ledger`, trusting peer events `verifier` accepts.
    pub fn new(config: RelayConfig, ledger: L, verifier: V) -> Self {
        Self {
            channel: PacketChannel::new(config.channel_account.clone()),
            relay: TokenRelay::new(config.clone(), ledger),
            config,
            verifier,
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The packet channel.
    pub fn channel(&self) -> &PacketChannel {
        &self.channel
    }

    /// The lock manager.
    pub fn relay(&self) -> &TokenRelay<L> {
        &self.relay
    }

    /// Mutable lock manager, for ledger bootstrap.
    pub fn relay_mut(&mut self) -> &mut TokenRelay<L> {
        &mut self.relay
    }

    /// Notification from an external ledger that a transfer completed.
    pub fn on_token_transfer(
        &mut self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Option<u64>, RelayError> {
        self.relay
            .on_token_transfer(&mut self.channel, contract, from, to, quantity, memo)
    }

    /// Take every queued outbox event.
    pub fn drain_outbox(&mut self) -> Vec<ChannelEvent> {
        self.channel.drain_outbox()
    }

    /// Deliver queued events in order; undelivered ones stay queued.
    pub async fn flush_outbox<T: RelayTransport>(
        &mut self,
        transport: &T,
    ) -> Result<usize, RelayError> {
        let events = self.channel.drain_outbox();
        for (delivered, event) in events.iter().enumerate() {
            if let Err(e) = transport.deliver(event.clone()).await {
                let rest = events[delivered..].to_vec();
                warn!("[icp-02] transport failed, {} events requeued: {}", rest.len(), e);
                self.channel.requeue(rest);
                return Err(e);
            }
        }
        if !events.is_empty() {
            debug!("[icp-02] flushed {} outbox events", events.len());
        }
        Ok(events.len())
    }

    fn accept_proven(&self, proven: &ProvenAction) -> Result<ChannelEvent, RelayError> {
        check_action_binding(proven, &self.config.peer_channel)?;
        self.verifier.verify(&proven.proof)?;
        ChannelEvent::decode(&proven.action)
    }
}

fn decode_for(bytes: &[u8], receiver: &Name) -> Result<RelayAction, RelayError> {
    let action = OutboundAction::decode(bytes)?;
    if &action.receiver != receiver {
        return Err(RelayError::UnexpectedReceiver {
            expected: receiver.clone(),
            got: action.receiver,
        });
    }
    Ok(action.action)
}

impl<L: TokenLedger, V: InclusionVerifier> TokenRelayApi for RelayService<L, V> {
    fn set_peer_contracts(
        &mut self,
        caller: &Name,
        icp: Name,
        peer: Name,
    ) -> Result<(), RelayError> {
        self.relay.set_peer_contracts(caller, icp, peer)
    }

    fn transfer(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Option<u64>, RelayError> {
        self.relay
            .transfer(&mut self.channel, caller, contract, from, to, quantity, memo)
    }

    fn relay_deposit(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError> {
        self.relay.relay_deposit(
            &mut self.channel,
            caller,
            contract,
            from,
            icp_to,
            quantity,
            memo,
            expiration,
        )
    }

    fn refund(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError> {
        self.relay.refund(
            &mut self.channel,
            caller,
            contract,
            from,
            icp_to,
            quantity,
            memo,
            expiration,
        )
    }

    fn deliver_packet(
        &mut self,
        proven: &ProvenAction,
        now: u32,
    ) -> Result<Option<IcpReceipt>, RelayError> {
        let ChannelEvent::Packet(packet) = self.accept_proven(proven)? else {
            return Err(RelayError::UnexpectedEvent("expected a packet".into()));
        };
        let relay_account = self.config.relay_account.clone();
        let caller = self.channel.account().clone();
        let relay = &mut self.relay;

        self.channel.on_packet(packet, now, |bytes| {
            match decode_for(bytes, &relay_account)? {
                RelayAction::Receive {
                    contract,
                    from,
                    to,
                    quantity,
                    memo,
                    refund,
                } => {
                    relay.on_inbound_transfer(
                        &caller,
                        &contract,
                        &from,
                        &to,
                        &quantity,
                        &memo,
                        refund,
                    )?;
                    Ok(Vec::new())
                }
                RelayAction::ReceiptCallback => Err(RelayError::UnexpectedEvent(
                    "receipt callback sent as packet".into(),
                )),
            }
        })
    }

    fn deliver_receipt(
        &mut self,
        proven: &ProvenAction,
    ) -> Result<Option<LockResolution>, RelayError> {
        let ChannelEvent::Receipt(receipt) = self.accept_proven(proven)? else {
            return Err(RelayError::UnexpectedEvent("expected a receipt".into()));
        };
        let caller = self.channel.account().clone();
        let relay_account = self.config.relay_account.clone();
        let relay = &mut self.relay;

        let resolved = self.channel.on_receipt(&receipt, |packet| {
            match decode_for(&packet.receipt_action, &relay_account)? {
                RelayAction::ReceiptCallback => {
                    relay.on_receipt(&caller, packet.seq, receipt.status, &receipt.data)
                }
                RelayAction::Receive { .. } => Err(RelayError::UnexpectedEvent(
                    "packet callback is not a receipt callback".into(),
                )),
            }
        })?;
        Ok(resolved.flatten())
    }

    fn cleanup(&mut self, seqs: &[u64]) -> usize {
        self.channel.cleanup(seqs)
    }
}
