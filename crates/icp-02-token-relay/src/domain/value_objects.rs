//! # Value Objects
//!
//! Receipt statuses, channel endpoints and the opaque action payloads
//! carried inside packets.

use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name};

use super::errors::RelayError;

/// Longest memo the relay forwards.
pub const MAX_MEMO_LEN: usize = 256;

/// Memo attached when a locked asset is released after expiry.
pub const RELEASE_MEMO: &str = "icp release locked asset";

/// Delivery status of a packet, as reported by the peer's receipt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReceiptStatus {
    /// Not yet resolved.
    #[default]
    Unknown = 0,
    /// Delivered and executed on the peer.
    Success = 1,
    /// Expired or failed on the peer.
    Expired = 2,
}

impl TryFrom<u8> for ReceiptStatus {
    type Error = RelayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReceiptStatus::Unknown),
            1 => Ok(ReceiptStatus::Success),
            2 => Ok(ReceiptStatus::Expired),
            other => Err(RelayError::MalformedReceipt(format!("status {other}"))),
        }
    }
}

/// Channel endpoints, set once by governance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerContracts {
    /// Packet channel account on this chain.
    pub icp: Name,
    /// Token relay account on the peer chain.
    pub peer: Name,
}

/// Action executed by a relay endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayAction {
    /// Credit a transfer arriving from the peer.
    Receive {
        /// Origin token contract on the sending chain
        contract: Name,
        /// Sender on the sending chain
        from: Name,
        /// Recipient on the receiving chain
        to: Name,
        /// Amount
        quantity: Asset,
        /// Forwarded memo
        memo: String,
        /// Refund flow: release native tokens instead of minting
        refund: bool,
    },
    /// Receipt callback template; the receipt supplies seq, status and data.
    ReceiptCallback,
}

/// A relay action addressed to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundAction {
    /// Account that executes the action.
    pub receiver: Name,
    /// The action.
    pub action: RelayAction,
}

impl OutboundAction {
    /// Opaque encoding stored in packets.
    pub fn encode(&self) -> Result<Vec<u8>, RelayError> {
        bincode::serialize(self).map_err(|e| RelayError::Codec(e.to_string()))
    }

    /// Decode an action stored in a packet.
    pub fn decode(bytes: &[u8]) -> Result<Self, RelayError> {
        bincode::deserialize(bytes).map_err(|e| RelayError::Codec(e.to_string()))
    }
}

/// How a transfer into the relay account is handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferIntent {
    /// `"icp <to> <expiration>"`: relay immediately.
    Relay {
        /// Recipient on the peer chain
        to: Name,
        /// Packet expiration, peer time in seconds
        expiration: u32,
    },
    /// Any other memo: stage as a deposit.
    Deposit,
}

/// Outcome of resolving a lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockResolution {
    /// Delivered; the relay keeps the asset.
    Settled,
    /// Expired; the asset went back to the sender.
    Released,
    /// Refund expired; the burned wrapped asset was re-minted.
    ReMinted,
}
