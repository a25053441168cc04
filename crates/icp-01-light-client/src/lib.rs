//! # ICP-01 Peer-Chain Light Client
//!
//! Fork-aware header store that follows a peer chain from a trusted seed and
//! proves that peer-chain actions executed in irreversible blocks.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Link signed headers onto every known branch, choosing the head by
//!   (LIB, block number)
//! - Track the producer schedule and derive irreversibility from 2/3+1
//!   producer confirmations
//! - Keep an incremental Merkle accumulator over block ids in every state
//! - Verify two-level inclusion proofs: action → block → irreversible anchor
//!
//! ## Safety Rules
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Scheduled producer only | Slot check + signature over `sig_digest` |
//! | LIB never regresses | `max(prev, computed)` per branch |
//! | No rewriting finality | Headers at or below the LIB are rejected |
//! | Proofs only against final history | Anchor must be at or below the watermark |
//!
//! ## Module Structure
//!
//! ```text
//! icp-01-light-client/
//! ├── domain/          # Headers, states, tables, incremental merkle, errors
//! ├── algorithms/      # Merkle, accumulator, finality, inclusion proofs
//! ├── ports/           # LightClientApi (inbound) + HeaderSignatureVerifier (outbound)
//! ├── adapters/        # Ed25519 signature verifier
//! ├── application/     # ForkStore orchestrating everything
//! └── config.rs        # LightClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use adapters::Ed25519HeaderVerifier;
pub use algorithms::{
    merkle_path, merkle_root, next_state, verify_at, verify_inclusion, verify_merkle_path,
    MerkleAccumulator,
};
pub use application::ForkStore;
pub use config::LightClientConfig;
pub use domain::{
    ActionReceipt, BlockHeader, BlockHeaderState, IncrementalMerkle, InclusionProof,
    LightClientError, PendingSchedule, ProducerKey, ProducerSchedule, SignedBlockHeader,
    StoreMeter, StoredBlock,
};
pub use ports::{HeaderSignatureVerifier, LightClientApi, MockSignatureVerifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
