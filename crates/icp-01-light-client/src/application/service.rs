//! # Fork Store Service
//!
//! Tracks every known branch of the peer chain on top of a trusted seed.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `LightClientApi` for header ingestion and proof checks
//! 2. Derives each block's state through `algorithms::next_state`
//! 3. Checks producer signatures through the `HeaderSignatureVerifier` port
//! 4. Prunes losing forks once the head's LIB passes them and bounds
//!    retained history with a `StoreMeter`
//!
//! Every operation validates fully before touching a table.

use std::collections::HashSet;

use shared_types::{Hash, Name};
use tracing::{debug, info, warn};

use crate::algorithms::finality::rebuild_for_schedule;
use crate::algorithms::{next_state, verify_inclusion};
use crate::config::LightClientConfig;
use crate::domain::{
    invariant_consecutive_ids, invariant_state_well_formed, num_from_id, BlockHeaderState,
    BlockStateTable, BlockTable, InclusionProof, LightClientError, PendingSchedule,
    ProducerSchedule, SignedBlockHeader, StoreMeter, StoredBlock,
};
use crate::ports::{HeaderSignatureVerifier, LightClientApi};

/// Fork-aware header store for one peer chain.
pub struct ForkStore<V: HeaderSignatureVerifier> {
    /// Account allowed to seed, reset and resize the store.
    owner: Name,
    /// Service configuration.
    config: LightClientConfig,
    /// Producer signature check.
    verifier: V,
    /// Every id the store can link or prove against.
    blocks: BlockTable,
    /// Full derived states.
    states: BlockStateTable,
    /// Retained-record bound.
    meter: StoreMeter,
    /// Heights up to here hold only the canonical chain.
    pruned_through: u32,
}

impl<V: HeaderSignatureVerifier> ForkStore<V> {
    /// Create an empty, unseeded store.
    pub fn new(owner: Name, verifier: V, config: LightClientConfig) -> Self {
        let meter = StoreMeter {
            max_blocks: config.max_blocks,
            current_blocks: 0,
        };
        Self {
            owner,
            config,
            verifier,
            blocks: BlockTable::default(),
            states: BlockStateTable::default(),
            meter,
            pruned_through: 0,
        }
    }

    /// Store owner.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Best state: highest LIB, then highest block number.
    pub fn head(&self) -> Option<&BlockHeaderState> {
        self.states.head()
    }

    /// LIB of the head, 0 before seeding.
    pub fn last_irreversible_blocknum(&self) -> u32 {
        self.head()
            .map_or(0, BlockHeaderState::last_irreversible_blocknum)
    }

    /// Derived state for a block id.
    pub fn state_by_id(&self, id: &Hash) -> Option<&BlockHeaderState> {
        self.states.get(id)
    }

    /// Current meter reading.
    pub fn meter(&self) -> StoreMeter {
        self.meter
    }

    /// Schedule the head was produced under.
    pub fn active_schedule(&self) -> Option<&ProducerSchedule> {
        self.head().map(|s| &s.active_schedule)
    }

    /// Proposal awaiting promotion on the head's branch.
    pub fn pending_schedule(&self) -> Option<&PendingSchedule> {
        self.head().and_then(|s| s.pending_schedule.as_ref())
    }

    /// Number of stored derived states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    fn require_owner(&self, caller: &Name) -> Result<(), LightClientError> {
        if caller != &self.owner {
            return Err(LightClientError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn check_signature(&self, state: &BlockHeaderState) -> Result<(), LightClientError> {
        if self.verifier.verify(
            &state.block_signing_key,
            &state.sig_digest(),
            &state.header.producer_signature,
        ) {
            Ok(())
        } else {
            Err(LightClientError::InvalidSignature(state.id))
        }
    }

    /// Persist a validated state, then settle irreversibility and the meter.
    fn commit(&mut self, state: BlockHeaderState, action_mroot: Option<Hash>) -> Hash {
        let id = state.id;
        self.blocks.insert(StoredBlock {
            id,
            block_num: state.block_num,
            previous: *state.previous(),
            action_mroot,
        });
        self.states.insert(state);
        self.advance_irreversible();
        self.enforce_meter();
        id
    }

    /// Drop every branch that lost to the head at or below its LIB.
    fn advance_irreversible(&mut self) {
        let Some(head) = self.states.head() else {
            return;
        };
        let lib = head.last_irreversible_blocknum().min(head.block_num);
        if lib <= self.pruned_through {
            return;
        }

        let mut canonical = HashSet::new();
        let mut cursor = self.blocks.get(&head.id);
        while let Some(block) = cursor {
            if block.block_num <= self.pruned_through {
                break;
            }
            if block.block_num <= lib {
                canonical.insert(block.id);
            }
            cursor = self.blocks.get(&block.previous);
        }

        let mut removed = 0;
        for (_, id) in self.blocks.ids_between(self.pruned_through + 1, lib) {
            if !canonical.contains(&id) {
                removed += self.remove_subtree(id);
            }
        }
        info!(
            "[icp-01] LIB advanced {} -> {} ({} forked records pruned)",
            self.pruned_through, lib, removed
        );
        self.pruned_through = lib;
    }

    /// Remove a block and everything built on it.
    fn remove_subtree(&mut self, root: Hash) -> usize {
        let mut stack = vec![root];
        let mut removed = 0;
        while let Some(id) = stack.pop() {
            stack.extend(self.blocks.children(&id));
            if self.blocks.remove(&id).is_some() {
                removed += 1;
            }
            self.states.remove(&id);
        }
        removed
    }

    /// Evict oldest records below the LIB until under the cap.
    fn enforce_meter(&mut self) {
        let lib = self.last_irreversible_blocknum();
        while self.blocks.len() > self.meter.max_blocks as usize {
            let Some((block_num, id)) = self.blocks.oldest() else {
                break;
            };
            if block_num >= lib {
                warn!(
                    "[icp-01] {} records exceed cap {} but none is below LIB {}",
                    self.blocks.len(),
                    self.meter.max_blocks,
                    lib
                );
                break;
            }
            self.blocks.remove(&id);
            self.states.remove(&id);
        }
        self.meter.current_blocks = u32::try_from(self.blocks.len()).unwrap_or(u32::MAX);
    }
}

impl<V: HeaderSignatureVerifier> LightClientApi for ForkStore<V> {
    fn init_seed(
        &mut self,
        caller: &Name,
        state: BlockHeaderState,
    ) -> Result<(), LightClientError> {
        self.require_owner(caller)?;
        if !self.states.is_empty() || !self.blocks.is_empty() {
            return Err(LightClientError::AlreadySeeded);
        }
        invariant_state_well_formed(&state)?;
        self.check_signature(&state)?;

        info!(
            "[icp-01] Seeded at block {} (LIB {})",
            state.block_num,
            state.last_irreversible_blocknum()
        );
        self.pruned_through = state.last_irreversible_blocknum().min(state.block_num);
        let action_mroot = state.header.header.action_mroot;
        self.commit(state, Some(action_mroot));
        Ok(())
    }

    fn add_header(&mut self, header: SignedBlockHeader) -> Result<Hash, LightClientError> {
        let lib = self
            .head()
            .ok_or(LightClientError::NotSeeded)?
            .last_irreversible_blocknum();
        let id = header.id();
        if self.blocks.contains(&id) {
            return Err(LightClientError::DuplicateBlock(id));
        }
        let block_num = header.block_num();
        if block_num <= lib {
            return Err(LightClientError::BelowIrreversible { block_num, lib });
        }
        let previous = header.header.previous;
        let prev = self
            .states
            .get(&previous)
            .ok_or(LightClientError::PreviousNotFound(previous))?;

        let action_mroot = header.header.action_mroot;
        let state = next_state(prev, header)?;
        self.check_signature(&state)?;

        debug!(
            "[icp-01] Accepted block {} {} from {}",
            block_num,
            hex::encode(&id[..8]),
            state.header.header.producer
        );
        Ok(self.commit(state, Some(action_mroot)))
    }

    fn add_header_with_merkle_path(
        &mut self,
        mut state: BlockHeaderState,
        merkle_path: Vec<Hash>,
    ) -> Result<Hash, LightClientError> {
        let lib = self
            .head()
            .ok_or(LightClientError::NotSeeded)?
            .last_irreversible_blocknum();
        if self.blocks.contains(&state.id) {
            return Err(LightClientError::DuplicateBlock(state.id));
        }
        invariant_state_well_formed(&state)?;
        if state.block_num <= lib {
            return Err(LightClientError::BelowIrreversible {
                block_num: state.block_num,
                lib,
            });
        }

        let bad_path = |reason: &str| Err(LightClientError::InvalidMerklePath(reason.to_string()));
        let (Some(first), Some(last)) = (merkle_path.first(), merkle_path.last()) else {
            return bad_path("empty path");
        };
        if merkle_path.len() > self.config.max_merkle_path_len {
            return bad_path("path too long");
        }
        let Some(anchor) = self.states.get(first) else {
            return bad_path("path does not start at a stored state");
        };
        if last != state.previous() {
            return bad_path("path does not end at the state's parent");
        }
        if !invariant_consecutive_ids(&merkle_path, anchor.block_num) {
            return bad_path("ids are not consecutive");
        }
        let mut bridged = anchor.blockroot_merkle.clone();
        for id in &merkle_path {
            bridged.append(*id);
        }
        if bridged != state.blockroot_merkle {
            return bad_path("path does not reproduce the state's blockroot");
        }

        let promoted = anchor.pending_schedule.as_ref().map(|p| &p.schedule);
        if state.active_schedule != anchor.active_schedule
            && Some(&state.active_schedule) != promoted
        {
            return Err(LightClientError::InvalidSchedule(
                "active schedule does not follow the anchor".into(),
            ));
        }
        let scheduled = state
            .active_schedule
            .scheduled_producer(state.header.header.timestamp)
            .map(|p| p.producer_name.clone())
            .ok_or_else(|| LightClientError::InvalidSchedule("active schedule is empty".into()))?;
        if scheduled != state.header.header.producer {
            return Err(LightClientError::WrongProducer {
                expected: scheduled,
                got: state.header.header.producer.clone(),
            });
        }
        if state.header.header.timestamp <= anchor.header.header.timestamp {
            return Err(LightClientError::InvalidHeader(
                "timestamp must increase along a branch".into(),
            ));
        }
        self.check_signature(&state)?;

        // The submitted metadata was not derived locally; trust only the anchor's.
        let anchor_lib = anchor.last_irreversible_blocknum();
        state.proposed_irreversible_blocknum = state.proposed_irreversible_blocknum.min(anchor_lib);
        state.consensus_irreversible_blocknum = anchor.consensus_irreversible_blocknum;
        state.fallback_irreversible_blocknum = anchor.fallback_irreversible_blocknum;
        for implied in state.producer_to_last_implied_irb.values_mut() {
            *implied = (*implied).min(anchor_lib);
        }
        state.producer_to_last_produced = rebuild_for_schedule(
            &state.active_schedule,
            &anchor.producer_to_last_produced,
            anchor_lib,
        );
        state
            .producer_to_last_produced
            .insert(state.header.header.producer.clone(), state.block_num);
        state.confirm_count.clear();

        for pair in merkle_path.windows(2) {
            self.blocks.insert(StoredBlock {
                id: pair[1],
                block_num: num_from_id(&pair[1]),
                previous: pair[0],
                action_mroot: None,
            });
        }
        info!(
            "[icp-01] Caught up to block {} over {} bridged ids",
            state.block_num,
            merkle_path.len()
        );
        let action_mroot = state.header.header.action_mroot;
        Ok(self.commit(state, Some(action_mroot)))
    }

    fn reset(
        &mut self,
        caller: &Name,
        clear_all: bool,
        max_blocks: u32,
    ) -> Result<(), LightClientError> {
        self.require_owner(caller)?;
        if clear_all {
            info!("[icp-01] Clearing fork store");
            self.blocks.clear();
            self.states.clear();
            self.pruned_through = 0;
        }
        self.meter.max_blocks = max_blocks;
        self.enforce_meter();
        Ok(())
    }

    fn set_max_blocks(&mut self, caller: &Name, max_blocks: u32) -> Result<(), LightClientError> {
        self.require_owner(caller)?;
        self.meter.max_blocks = max_blocks;
        self.enforce_meter();
        Ok(())
    }

    fn block_by_id(&self, id: &Hash) -> Result<StoredBlock, LightClientError> {
        self.blocks
            .get(id)
            .cloned()
            .ok_or(LightClientError::BlockNotFound(*id))
    }

    fn block_by_num(&self, block_num: u32) -> Result<StoredBlock, LightClientError> {
        let head = self.head().ok_or(LightClientError::NotSeeded)?;
        if block_num <= self.pruned_through {
            // Only the canonical chain survives below the prune line.
            if let [id] = self.blocks.ids_at(block_num).as_slice() {
                return self.block_by_id(id);
            }
        }
        let mut cursor = self.blocks.get(&head.id);
        while let Some(block) = cursor {
            if block.block_num == block_num {
                return Ok(block.clone());
            }
            if block.block_num < block_num {
                break;
            }
            cursor = self.blocks.get(&block.previous);
        }
        Err(LightClientError::BlockNumNotFound(block_num))
    }

    fn most_recent_irreversible(&self) -> Result<StoredBlock, LightClientError> {
        let lib = self
            .head()
            .ok_or(LightClientError::NotSeeded)?
            .last_irreversible_blocknum();
        self.block_by_num(lib)
    }

    fn action_mroot(&self, id: &Hash) -> Result<Hash, LightClientError> {
        self.block_by_id(id)?
            .action_mroot
            .ok_or(LightClientError::MissingActionRoot(*id))
    }

    fn verify_inclusion(&self, proof: &InclusionProof) -> Result<(), LightClientError> {
        self.verify_inclusion_at(proof, u32::MAX)
    }

    fn verify_inclusion_at(
        &self,
        proof: &InclusionProof,
        watermark: u32,
    ) -> Result<(), LightClientError> {
        let lib = self
            .head()
            .ok_or(LightClientError::NotSeeded)?
            .last_irreversible_blocknum();
        let watermark = watermark.min(lib);
        let action_root = self.action_mroot(&proof.block_id)?;
        let anchor = self
            .states
            .with_root(&proof.anchor_root)
            .next()
            .ok_or(LightClientError::UnknownAnchor(proof.anchor_root))?;
        if anchor.block_num > watermark {
            return Err(LightClientError::AnchorNotIrreversible {
                anchor: anchor.block_num,
                watermark,
            });
        }
        verify_inclusion(proof, &action_root, anchor.blockroot_merkle.leaf_count())
    }
}
