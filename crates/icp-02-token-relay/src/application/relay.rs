//! # Token Relay
//!
//! Lock manager for cross-chain token transfers.
//!
//! A transfer locks the sender's asset (or burns a wrapped one) and sends a
//! sequenced packet through the `PacketChannel`. The lock lives until the
//! peer's receipt resolves it:
//!
//! ```text
//! Locked ──success──▶ Settled
//!    └────expired──▶ Released (native lock) | ReMinted (refund lock)
//! ```
//!
//! Every ledger call that can fail runs before any relay table changes.

use shared_types::{Asset, Name};
use tracing::{debug, info};

use super::channel::PacketChannel;
use crate::algorithms::parse_transfer_memo;
use crate::config::RelayConfig;
use crate::domain::{
    invariant_authorized, invariant_memo_len, invariant_positive_quantity,
    invariant_resolving_status, DepositTable, LockResolution, LockedBalance, LockedTable,
    OutboundAction, PeerContracts, ReceiptStatus, RelayAction, RelayError, TransferIntent,
    RELEASE_MEMO,
};
use crate::ports::TokenLedger;

/// A packet fully encoded, waiting to be sent and locked.
#[derive(Debug)]
struct PreparedPacket {
    send_action: Vec<u8>,
    receipt_action: Vec<u8>,
    expiration: u32,
    lock: LockedBalance,
}

/// What a transfer notification into the relay account does.
#[derive(Debug)]
enum Notification {
    Ignore,
    Stage,
    Relay(PreparedPacket),
}

/// Relay endpoint: deposits, locks and the token ledger it settles against.
pub struct TokenRelay<L: TokenLedger> {
    config: RelayConfig,
    contracts: Option<PeerContracts>,
    deposits: DepositTable,
    locked: LockedTable,
    ledger: L,
}

impl<L: TokenLedger> TokenRelay<L> {
    /// Create a relay with no peer contracts set.
    pub fn new(config: RelayConfig, ledger: L) -> Self {
        Self {
            config,
            contracts: None,
            deposits: DepositTable::default(),
            locked: LockedTable::default(),
            ledger,
        }
    }

    /// Relay account.
    pub fn account(&self) -> &Name {
        &self.config.relay_account
    }

    /// Channel endpoints, once set.
    pub fn contracts(&self) -> Option<&PeerContracts> {
        self.contracts.as_ref()
    }

    /// Staged deposits.
    pub fn deposits(&self) -> &DepositTable {
        &self.deposits
    }

    /// Outstanding locks.
    pub fn locked(&self) -> &LockedTable {
        &self.locked
    }

    /// Underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable ledger, for issuing and creating tokens outside the relay.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    fn require_contracts(&self) -> Result<&PeerContracts, RelayError> {
        self.contracts.as_ref().ok_or(RelayError::ContractsNotSet)
    }

    fn check_user_input(
        &self,
        caller: &Name,
        from: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), RelayError> {
        invariant_authorized(caller, from)?;
        invariant_memo_len(memo, self.config.max_memo_len)?;
        invariant_positive_quantity(quantity)
    }

    /// Governance: fix the channel endpoints.
    pub fn set_peer_contracts(
        &mut self,
        caller: &Name,
        icp: Name,
        peer: Name,
    ) -> Result<(), RelayError> {
        invariant_authorized(caller, &self.config.relay_account)?;
        if self.contracts.is_some() {
            return Err(RelayError::ContractsAlreadySet);
        }
        info!("[icp-02] peer contracts set: icp={} peer={}", icp, peer);
        self.contracts = Some(PeerContracts { icp, peer });
        Ok(())
    }

    /// Native transfer by `from`, followed by the relay's notification.
    ///
    /// Returns the packet sequence when the transfer was relayed.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        &mut self,
        channel: &mut PacketChannel,
        caller: &Name,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Option<u64>, RelayError> {
        self.check_user_input(caller, from, quantity, memo)?;
        let notification = self.prepare_notification(contract, from, to, quantity, memo)?;
        self.ledger.transfer(contract, from, to, quantity, memo)?;
        self.apply_notification(channel, notification, contract, from, quantity)
    }

    /// Notification of a completed native transfer.
    ///
    /// Only transfers into the relay account matter: an
    /// `"icp <to> <expiration>"` memo relays them, anything else stages a
    /// deposit.
    pub fn on_token_transfer(
        &mut self,
        channel: &mut PacketChannel,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Option<u64>, RelayError> {
        let notification = self.prepare_notification(contract, from, to, quantity, memo)?;
        self.apply_notification(channel, notification, contract, from, quantity)
    }

    fn prepare_notification(
        &self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<Notification, RelayError> {
        if to != &self.config.relay_account || from == &self.config.relay_account {
            return Ok(Notification::Ignore);
        }
        invariant_positive_quantity(quantity)?;
        match parse_transfer_memo(memo)? {
            TransferIntent::Relay { to, expiration } => {
                let packet =
                    self.prepare_packet(contract, from, &to, quantity, memo, expiration, false)?;
                Ok(Notification::Relay(packet))
            }
            TransferIntent::Deposit => {
                if let Some(staged) = self.deposits.get(contract, from, &quantity.symbol) {
                    staged.balance.checked_add(quantity)?;
                }
                Ok(Notification::Stage)
            }
        }
    }

    fn apply_notification(
        &mut self,
        channel: &mut PacketChannel,
        notification: Notification,
        contract: &Name,
        from: &Name,
        quantity: &Asset,
    ) -> Result<Option<u64>, RelayError> {
        match notification {
            Notification::Ignore => Ok(None),
            Notification::Stage => {
                let deposit = self.deposits.stage(contract, from, quantity)?;
                debug!("[icp-02] {} staged {} (now {})", from, quantity, deposit.balance);
                Ok(None)
            }
            Notification::Relay(packet) => Ok(Some(self.commit_packet(channel, packet))),
        }
    }

    /// Relay a staged deposit to `icp_to` on the peer.
    #[allow(clippy::too_many_arguments)]
    pub fn relay_deposit(
        &mut self,
        channel: &mut PacketChannel,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError> {
        self.check_user_input(caller, from, quantity, memo)?;
        self.deposits.check_consume(contract, from, quantity)?;
        let packet =
            self.prepare_packet(contract, from, icp_to, quantity, memo, expiration, false)?;
        self.deposits.consume(contract, from, quantity)?;
        Ok(self.commit_packet(channel, packet))
    }

    /// Burn wrapped tokens of peer `contract` and send them home.
    #[allow(clippy::too_many_arguments)]
    pub fn refund(
        &mut self,
        channel: &mut PacketChannel,
        caller: &Name,
        contract: &Name,
        from: &Name,
        icp_to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
    ) -> Result<u64, RelayError> {
        self.check_user_input(caller, from, quantity, memo)?;
        self.initiate(channel, contract, from, icp_to, quantity, memo, expiration, true)
    }

    /// Lock `quantity` of `from` and send a packet crediting `to` on the peer.
    ///
    /// Native assets move into the relay account; a `refund` burns the
    /// wrapped asset instead. Nothing is recorded unless the ledger call
    /// succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn initiate(
        &mut self,
        channel: &mut PacketChannel,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
        refund: bool,
    ) -> Result<u64, RelayError> {
        invariant_positive_quantity(quantity)?;
        let packet = self.prepare_packet(contract, from, to, quantity, memo, expiration, refund)?;
        if refund {
            self.ledger.burn(contract, from, quantity)?;
        } else {
            let relay = self.config.relay_account.clone();
            self.ledger.transfer(contract, from, &relay, quantity, memo)?;
        }
        Ok(self.commit_packet(channel, packet))
    }

    #[allow(clippy::too_many_arguments)]
    fn prepare_packet(
        &self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
        expiration: u32,
        refund: bool,
    ) -> Result<PreparedPacket, RelayError> {
        let contracts = self.require_contracts()?;
        let send_action = OutboundAction {
            receiver: contracts.peer.clone(),
            action: RelayAction::Receive {
                contract: contract.clone(),
                from: from.clone(),
                to: to.clone(),
                quantity: quantity.clone(),
                memo: memo.to_string(),
                refund,
            },
        }
        .encode()?;
        let receipt_action = OutboundAction {
            receiver: self.config.relay_account.clone(),
            action: RelayAction::ReceiptCallback,
        }
        .encode()?;
        Ok(PreparedPacket {
            send_action,
            receipt_action,
            expiration,
            lock: LockedBalance {
                seq: 0,
                contract: contract.clone(),
                account: from.clone(),
                balance: quantity.clone(),
                refund,
            },
        })
    }

    fn commit_packet(&mut self, channel: &mut PacketChannel, packet: PreparedPacket) -> u64 {
        let seq = channel.send(packet.send_action, packet.expiration, packet.receipt_action);
        let lock = LockedBalance { seq, ..packet.lock };
        info!(
            "[icp-02] locked {} of {} for packet {}{}",
            lock.balance,
            lock.account,
            seq,
            if lock.refund { " (refund)" } else { "" }
        );
        self.locked.insert(lock);
        seq
    }

    /// Callback: credit a transfer proven from the peer.
    ///
    /// Normal deliveries mint wrapped tokens; refund deliveries release
    /// native tokens held by the relay.
    #[allow(clippy::too_many_arguments)]
    pub fn on_inbound_transfer(
        &mut self,
        caller: &Name,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
        refund: bool,
    ) -> Result<(), RelayError> {
        let contracts = self.require_contracts()?;
        invariant_authorized(caller, &contracts.icp)?;
        invariant_memo_len(memo, self.config.max_memo_len)?;
        invariant_positive_quantity(quantity)?;

        if refund {
            let relay = self.config.relay_account.clone();
            self.ledger.transfer(contract, &relay, to, quantity, memo)?;
        } else {
            self.ledger.mint(contract, to, quantity)?;
        }
        info!(
            "[icp-02] inbound {} from {} to {}{}",
            quantity,
            from,
            to,
            if refund { " (refund)" } else { "" }
        );
        Ok(())
    }

    /// Callback: resolve the lock of packet `seq`.
    ///
    /// A missing lock means the packet was already resolved; that is a
    /// no-op.
    pub fn on_receipt(
        &mut self,
        caller: &Name,
        seq: u64,
        status: ReceiptStatus,
        data: &[u8],
    ) -> Result<Option<LockResolution>, RelayError> {
        let contracts = self.require_contracts()?;
        invariant_authorized(caller, &contracts.icp)?;
        invariant_resolving_status(status)?;

        let Some(lock) = self.locked.get(seq).cloned() else {
            debug!("[icp-02] no lock for packet {}", seq);
            return Ok(None);
        };

        let resolution = match status {
            ReceiptStatus::Expired if lock.refund => {
                self.ledger.mint(&lock.contract, &lock.account, &lock.balance)?;
                LockResolution::ReMinted
            }
            ReceiptStatus::Expired => {
                let relay = self.config.relay_account.clone();
                let (contract, account) = (&lock.contract, &lock.account);
                self.ledger.transfer(contract, &relay, account, &lock.balance, RELEASE_MEMO)?;
                LockResolution::Released
            }
            _ => LockResolution::Settled,
        };
        self.locked.remove(seq);

        info!(
            "[icp-02] packet {} lock {:?}: {} for {} ({} data bytes)",
            seq,
            resolution,
            lock.balance,
            lock.account,
            data.len()
        );
        Ok(Some(resolution))
    }
}
