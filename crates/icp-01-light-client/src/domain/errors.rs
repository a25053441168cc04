//! # Domain Errors
//!
//! Error types for the peer-chain light client.
//!
//! Every rejection is synchronous and leaves the store untouched.

use shared_types::{Hash, Name};
use thiserror::Error;

/// Light client error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightClientError {
    /// Caller lacks the owner permission for a privileged operation.
    #[error("Unauthorized: {caller} is not the store owner")]
    Unauthorized {
        /// Account that attempted the call
        caller: Name,
    },

    /// No seed block has been installed yet.
    #[error("Fork store is not seeded")]
    NotSeeded,

    /// A seed is already present; reset with `clear_all` first.
    #[error("Fork store already seeded")]
    AlreadySeeded,

    /// Header links to a block the store has never seen.
    #[error("Previous block not found: {}", hex::encode(.0))]
    PreviousNotFound(Hash),

    /// Header id already stored.
    #[error("Duplicate block: {}", hex::encode(.0))]
    DuplicateBlock(Hash),

    /// Header sits at or below the last irreversible block.
    #[error("Block {block_num} is at or below irreversible block {lib}")]
    BelowIrreversible {
        /// Number of the rejected block
        block_num: u32,
        /// Current last irreversible block number
        lib: u32,
    },

    /// Structural problem with a header or submitted state.
    #[error("Invalid block header: {0}")]
    InvalidHeader(String),

    /// Header producer is not the one scheduled for its slot.
    #[error("Wrong producer: expected {expected}, got {got}")]
    WrongProducer {
        /// Producer owning the slot
        expected: Name,
        /// Producer named in the header
        got: Name,
    },

    /// Header claims a schedule version other than the active one.
    #[error("Schedule version mismatch: active {active}, header {header}")]
    ScheduleVersionMismatch {
        /// Version of the active schedule
        active: u32,
        /// Version claimed by the header
        header: u32,
    },

    /// Producer signature does not verify.
    #[error("Invalid producer signature for block {}", hex::encode(.0))]
    InvalidSignature(Hash),

    /// Schedule proposal rejected.
    #[error("Invalid producer schedule: {0}")]
    InvalidSchedule(String),

    /// A pending schedule must be promoted before another is proposed.
    #[error("Pending schedule (version {0}) not yet promoted")]
    PendingScheduleExists(u32),

    /// Merkle path submitted with a header is inconsistent.
    #[error("Invalid merkle path: {0}")]
    InvalidMerklePath(String),

    /// Block not stored.
    #[error("Block not found: {}", hex::encode(.0))]
    BlockNotFound(Hash),

    /// No block at the requested number on the canonical chain.
    #[error("No block at number {0}")]
    BlockNumNotFound(u32),

    /// Block known only by id; its action root was never ingested.
    #[error("No action merkle root for block {}", hex::encode(.0))]
    MissingActionRoot(Hash),

    /// Action path does not reproduce the block's action root.
    #[error("Action merkle proof verification failed")]
    InvalidActionProof,

    /// Block path does not reproduce the anchor root.
    #[error("Block merkle proof verification failed")]
    InvalidBlockProof,

    /// Anchor root is not the accumulator root of any stored state.
    #[error("Unknown anchor root: {}", hex::encode(.0))]
    UnknownAnchor(Hash),

    /// Anchor state is above the irreversibility watermark.
    #[error("Anchor block {anchor} is above irreversible watermark {watermark}")]
    AnchorNotIrreversible {
        /// Number of the anchor block
        anchor: u32,
        /// Watermark the anchor had to be at or below
        watermark: u32,
    },

    /// Proven block is not strictly before the anchor.
    #[error("Block {block_num} is not covered by anchor {anchor}")]
    BlockNotCoveredByAnchor {
        /// Number of the proven block
        block_num: u32,
        /// Number of the anchor block
        anchor: u32,
    },
}
