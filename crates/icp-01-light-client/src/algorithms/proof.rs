//! # Inclusion Proofs
//!
//! Two-stage check that an action executed inside an irreversible block.

use shared_types::Hash;

use super::merkle::{verify_at, verify_merkle_path};
use crate::domain::{num_from_id, InclusionProof, LightClientError};

/// Verify `proof` given the block's action root and the anchor's size.
///
/// `anchor_leaf_count` is the number of block ids the anchor root covers,
/// i.e. the anchor block number minus one. Block ids sit at leaf
/// `block_num - 1`, so both position and path length are fixed.
pub fn verify_inclusion(
    proof: &InclusionProof,
    action_root: &Hash,
    anchor_leaf_count: u64,
) -> Result<(), LightClientError> {
    if !verify_merkle_path(&proof.action_digest, &proof.action_path, action_root) {
        return Err(LightClientError::InvalidActionProof);
    }

    let block_num = num_from_id(&proof.block_id);
    if block_num == 0 || u64::from(block_num) > anchor_leaf_count {
        return Err(LightClientError::BlockNotCoveredByAnchor {
            block_num,
            anchor: u32::try_from(anchor_leaf_count + 1).unwrap_or(u32::MAX),
        });
    }
    let leaf_index = u64::from(block_num) - 1;
    if !verify_at(
        &proof.block_id,
        leaf_index,
        anchor_leaf_count,
        &proof.block_path,
        &proof.anchor_root,
    ) {
        return Err(LightClientError::InvalidBlockProof);
    }
    Ok(())
}
