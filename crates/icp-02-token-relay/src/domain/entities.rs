//! # Domain Entities
//!
//! Packets, receipts, locks and deposits of one relay channel.

use icp_01_light_client::{ActionReceipt, InclusionProof};
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name};

use super::errors::RelayError;
use super::value_objects::ReceiptStatus;

/// A sequenced cross-chain packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcpPacket {
    /// Strictly increasing per channel, never reused.
    pub seq: u64,
    /// Peer-chain time (seconds) after which the packet is expired.
    pub expiration: u32,
    /// Encoded `OutboundAction` executed on the peer.
    pub send_action: Vec<u8>,
    /// Encoded callback run here when the receipt returns.
    pub receipt_action: Vec<u8>,
    /// Changes exactly once, away from `Unknown`.
    pub status: ReceiptStatus,
    /// Mirror of a packet received from the peer.
    pub shadow: bool,
}

/// Acknowledgment of a packet received from the peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcpReceipt {
    /// Receipt sequence of the issuing channel.
    pub seq: u64,
    /// Sequence of the acknowledged packet.
    pub pseq: u64,
    /// `Success` or `Expired`.
    pub status: ReceiptStatus,
    /// Extra data returned by the dispatched action.
    pub data: Vec<u8>,
    /// Mirror of a receipt received from the peer.
    pub shadow: bool,
}

/// Asset held by the relay until its packet resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalance {
    /// Outbound packet sequence.
    pub seq: u64,
    /// Token contract the asset belongs to.
    pub contract: Name,
    /// Sender to compensate on expiry.
    pub account: Name,
    /// Locked amount.
    pub balance: Asset,
    /// Refund flow: the asset was burned, so expiry re-mints it.
    pub refund: bool,
}

/// Tokens staged by a plain transfer, waiting for an explicit relay call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Auto-allocated primary key.
    pub pk: u64,
    /// Token contract.
    pub contract: Name,
    /// Depositor.
    pub account: Name,
    /// Staged amount, always positive.
    pub balance: Asset,
}

/// Event the packet channel records on its own chain.
///
/// The peer proves these actions and replays them locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelEvent {
    /// A packet sent to the peer.
    Packet(IcpPacket),
    /// A receipt for a packet received from the peer.
    Receipt(IcpReceipt),
}

impl ChannelEvent {
    /// Action bytes as executed by the channel account.
    pub fn encode(&self) -> Result<Vec<u8>, RelayError> {
        bincode::serialize(self).map_err(|e| RelayError::Codec(e.to_string()))
    }

    /// Decode proven action bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, RelayError> {
        bincode::deserialize(bytes).map_err(|e| RelayError::Codec(e.to_string()))
    }
}

/// A peer-chain action plus everything needed to prove it executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenAction {
    /// Encoded `ChannelEvent`.
    pub action: Vec<u8>,
    /// Receipt of the action's execution on the peer.
    pub receipt: ActionReceipt,
    /// Proof of the receipt against an irreversible peer block.
    pub proof: InclusionProof,
}
