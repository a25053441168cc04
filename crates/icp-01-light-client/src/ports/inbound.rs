//! # Inbound Ports
//!
//! API trait defining what the fork store can do.
//!
//! Every mutating call is one atomic step: it either fully applies or
//! returns an error with the store unchanged.

use shared_types::{Hash, Name};

use crate::domain::{
    BlockHeaderState, InclusionProof, LightClientError, SignedBlockHeader, StoredBlock,
};

/// Fork store API - inbound port.
pub trait LightClientApi {
    /// Install the trusted starting state. Owner only, empty store only.
    fn init_seed(&mut self, caller: &Name, state: BlockHeaderState) -> Result<(), LightClientError>;

    /// Link a header onto a stored state; returns the new block id.
    fn add_header(&mut self, header: SignedBlockHeader) -> Result<Hash, LightClientError>;

    /// Jump ahead: accept a full state whose ancestry is bridged by `merkle_path`.
    ///
    /// `merkle_path[0]` must be a stored state and the last id the state's parent.
    fn add_header_with_merkle_path(
        &mut self,
        state: BlockHeaderState,
        merkle_path: Vec<Hash>,
    ) -> Result<Hash, LightClientError>;

    /// Wipe everything (`clear_all`) or just re-bound retained history.
    fn reset(
        &mut self,
        caller: &Name,
        clear_all: bool,
        max_blocks: u32,
    ) -> Result<(), LightClientError>;

    /// Change the retained-record cap.
    fn set_max_blocks(&mut self, caller: &Name, max_blocks: u32) -> Result<(), LightClientError>;

    /// Stored block by id.
    fn block_by_id(&self, id: &Hash) -> Result<StoredBlock, LightClientError>;

    /// Block at a number on the best chain.
    fn block_by_num(&self, block_num: u32) -> Result<StoredBlock, LightClientError>;

    /// The last irreversible block of the best chain.
    fn most_recent_irreversible(&self) -> Result<StoredBlock, LightClientError>;

    /// Action root recorded for a block.
    fn action_mroot(&self, id: &Hash) -> Result<Hash, LightClientError>;

    /// Check an inclusion proof against the store's irreversible history.
    fn verify_inclusion(&self, proof: &InclusionProof) -> Result<(), LightClientError>;

    /// As `verify_inclusion`, with a caller-supplied (stricter) watermark.
    fn verify_inclusion_at(
        &self,
        proof: &InclusionProof,
        watermark: u32,
    ) -> Result<(), LightClientError>;
}
