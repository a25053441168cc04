//! # Algorithms
//!
//! Pure functions behind the fork store: Merkle construction and
//! verification, the historical accumulator, per-block state derivation and
//! inclusion proof checks.

pub mod accumulator;
pub mod finality;
pub mod merkle;
pub mod proof;

pub use accumulator::MerkleAccumulator;
pub use finality::{apply_confirmations, calc_consensus_irreversible, next_state};
pub use merkle::{
    compute_root_from_path, merkle_path, merkle_root, path_length, verify_at, verify_merkle_path,
};
pub use proof::verify_inclusion;
