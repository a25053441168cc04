//! # Value Objects
//!
//! Block-number helpers, protocol constants, action receipts and proofs.

use serde::{Deserialize, Serialize};
use shared_crypto::DigestWriter;
use shared_types::{Hash, Name};

/// Consecutive slots owned by each producer in a round.
pub const PRODUCER_REPETITIONS: u32 = 12;

/// Largest producer schedule accepted.
pub const MAX_PRODUCERS: usize = 125;

/// Upper bound on the per-state confirmation window.
pub const MAX_TRACKED_CONFIRMATIONS: usize = 1024;

/// Block number embedded in the first four bytes of a block id.
pub fn num_from_id(id: &Hash) -> u32 {
    u32::from_be_bytes([id[0], id[1], id[2], id[3]])
}

/// Overwrite the first four bytes of a digest with a block number.
pub fn id_with_num(digest: Hash, block_num: u32) -> Hash {
    let mut id = digest;
    id[..4].copy_from_slice(&block_num.to_be_bytes());
    id
}

/// Confirmations needed from a schedule of `producer_count`: ⌊2n/3⌋ + 1.
pub fn required_confirmations(producer_count: usize) -> usize {
    producer_count * 2 / 3 + 1
}

/// Receipt of an executed action; its digest is a leaf of the action root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// Account whose handler ran the action.
    pub receiver: Name,
    /// SHA-256 of the encoded action.
    pub act_digest: Hash,
    /// Chain-wide action counter.
    pub global_sequence: u64,
    /// Per-receiver action counter.
    pub recv_sequence: u64,
}

impl ActionReceipt {
    /// Leaf digest committed in the block's action root.
    pub fn digest(&self) -> Hash {
        DigestWriter::new()
            .bytes(&self.receiver.to_canonical_bytes())
            .bytes(&self.act_digest)
            .u64(self.global_sequence)
            .u64(self.recv_sequence)
            .finish()
    }
}

/// Two-level inclusion proof: action → block → irreversible anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Leaf digest of the proven action receipt.
    pub action_digest: Hash,
    /// Canonical path from the action digest to the block's action root.
    pub action_path: Vec<Hash>,
    /// Block containing the action.
    pub block_id: Hash,
    /// Canonical path from the block id to the anchor root.
    pub block_path: Vec<Hash>,
    /// Accumulator root of an irreversible anchor state.
    pub anchor_root: Hash,
}
