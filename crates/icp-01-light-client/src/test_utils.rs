//! # Test Utilities
//!
//! A deterministic peer chain: producers sign with keys derived from their
//! names, every produced id is kept in a full accumulator so proofs can be
//! built against any historical anchor.

use std::collections::{BTreeMap, HashMap};

use shared_crypto::{sha256, Ed25519KeyPair};
use shared_types::{BlockTimestamp, Hash, Name, ZERO_HASH};

use crate::algorithms::{merkle_path, merkle_root, next_state, MerkleAccumulator};
use crate::domain::{
    ActionReceipt, BlockHeader, BlockHeaderState, InclusionProof, ProducerKey, ProducerSchedule,
    SignedBlockHeader,
};

/// Signing keys for a producer, derived from its name.
pub fn producer_keys(producer: &Name) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(sha256(&producer.to_canonical_bytes()))
}

/// Schedule whose keys match [`producer_keys`].
pub fn schedule_for(version: u32, producers: &[&str]) -> ProducerSchedule {
    ProducerSchedule {
        version,
        producers: producers
            .iter()
            .map(|p| {
                let producer_name = Name::new(*p).expect("valid producer name");
                let block_signing_key = *producer_keys(&producer_name).public_key().as_bytes();
                ProducerKey {
                    producer_name,
                    block_signing_key,
                }
            })
            .collect(),
    }
}

/// Simulated peer chain producing signed headers.
#[derive(Debug, Clone)]
pub struct ChainSimulator {
    states: Vec<BlockHeaderState>,
    ids: MerkleAccumulator,
    receipts: HashMap<Hash, Vec<ActionReceipt>>,
    queued: Vec<ActionReceipt>,
    proposal: Option<ProducerSchedule>,
    last_produced: BTreeMap<Name, u32>,
    global_sequence: u64,
    recv_sequence: BTreeMap<Name, u64>,
    skip: u32,
}

impl ChainSimulator {
    /// Start a chain whose genesis block is produced by `producers[0]`.
    pub fn new(producers: &[&str]) -> Self {
        let schedule = schedule_for(0, producers);
        let producer = schedule.producers[0].producer_name.clone();
        let mut header = SignedBlockHeader {
            header: BlockHeader {
                timestamp: BlockTimestamp(0),
                producer: producer.clone(),
                confirmed: 0,
                previous: ZERO_HASH,
                transaction_mroot: ZERO_HASH,
                action_mroot: ZERO_HASH,
                schedule_version: 0,
                new_producers: None,
                header_extensions: vec![],
            },
            producer_signature: [0; 64],
        };
        let mut genesis =
            BlockHeaderState::genesis(header.clone(), schedule).expect("valid genesis");
        header.producer_signature = *producer_keys(&producer)
            .sign_digest(&genesis.sig_digest())
            .as_bytes();
        genesis.header = header;

        let mut ids = MerkleAccumulator::new();
        ids.append(genesis.id);
        Self {
            receipts: HashMap::from([(genesis.id, Vec::new())]),
            states: vec![genesis],
            ids,
            queued: Vec::new(),
            proposal: None,
            last_produced: BTreeMap::from([(producer, 1)]),
            global_sequence: 0,
            recv_sequence: BTreeMap::new(),
            skip: 0,
        }
    }

    /// State of block 1.
    pub fn genesis(&self) -> &BlockHeaderState {
        &self.states[0]
    }

    /// Newest state.
    pub fn head(&self) -> &BlockHeaderState {
        self.states.last().expect("chain is never empty")
    }

    /// State at a block number.
    pub fn state(&self, block_num: u32) -> Option<&BlockHeaderState> {
        self.states.get(block_num.checked_sub(1)? as usize)
    }

    /// Signed header at a block number.
    pub fn header(&self, block_num: u32) -> Option<&SignedBlockHeader> {
        self.state(block_num).map(|s| &s.header)
    }

    /// Execute an action in the next block; returns its receipt.
    pub fn push_action(&mut self, receiver: &Name, action: &[u8]) -> ActionReceipt {
        self.global_sequence += 1;
        let recv = self.recv_sequence.entry(receiver.clone()).or_default();
        *recv += 1;
        let receipt = ActionReceipt {
            receiver: receiver.clone(),
            act_digest: sha256(action),
            global_sequence: self.global_sequence,
            recv_sequence: *recv,
        };
        self.queued.push(receipt.clone());
        receipt
    }

    /// Carry a schedule proposal in the next block.
    pub fn propose_schedule(&mut self, schedule: ProducerSchedule) {
        self.proposal = Some(schedule);
    }

    /// Leave `slots` empty before the next block.
    pub fn skip_slots(&mut self, slots: u32) {
        self.skip += slots;
    }

    /// Produce and sign the next block.
    pub fn produce_block(&mut self) -> SignedBlockHeader {
        let prev = self.head().clone();
        let timestamp = BlockTimestamp(prev.header.header.timestamp.slot() + 1 + self.skip);
        self.skip = 0;

        let schedule = match &prev.pending_schedule {
            Some(pending) if prev.last_irreversible_blocknum() >= pending.lib_num => {
                &pending.schedule
            }
            _ => &prev.active_schedule,
        };
        let producer = schedule
            .scheduled_producer(timestamp)
            .expect("schedule is non-empty")
            .producer_name
            .clone();
        let schedule_version = schedule.version;
        let confirmed = self
            .last_produced
            .get(&producer)
            .map_or(0, |last| prev.block_num.saturating_sub(*last).min(u32::from(u16::MAX)) as u16);

        let receipts = std::mem::take(&mut self.queued);
        let digests: Vec<Hash> = receipts.iter().map(ActionReceipt::digest).collect();
        let mut header = SignedBlockHeader {
            header: BlockHeader {
                timestamp,
                producer: producer.clone(),
                confirmed,
                previous: prev.id,
                transaction_mroot: ZERO_HASH,
                action_mroot: merkle_root(&digests),
                schedule_version,
                new_producers: self.proposal.take(),
                header_extensions: vec![],
            },
            producer_signature: [0; 64],
        };
        let mut state = next_state(&prev, header.clone()).expect("simulated header is valid");
        header.producer_signature = *producer_keys(&producer)
            .sign_digest(&state.sig_digest())
            .as_bytes();
        state.header = header.clone();

        self.last_produced.insert(producer, state.block_num);
        self.ids.append(state.id);
        self.receipts.insert(state.id, receipts);
        self.states.push(state);
        header
    }

    /// Produce `count` blocks.
    pub fn produce_blocks(&mut self, count: usize) -> Vec<SignedBlockHeader> {
        (0..count).map(|_| self.produce_block()).collect()
    }

    /// Produce until `block_num` is irreversible on the head.
    ///
    /// Panics if irreversibility has not caught up after 10 000 blocks.
    pub fn produce_until_irreversible(&mut self, block_num: u32) -> Vec<SignedBlockHeader> {
        let mut produced = Vec::new();
        while self.head().last_irreversible_blocknum() < block_num {
            assert!(produced.len() < 10_000, "irreversibility is not advancing");
            produced.push(self.produce_block());
        }
        produced
    }

    /// Copy of this chain truncated to `block_num`, for building a fork.
    pub fn fork_at(&self, block_num: u32) -> Self {
        let keep = block_num.max(1) as usize;
        let states: Vec<BlockHeaderState> = self.states.iter().take(keep).cloned().collect();
        let mut ids = MerkleAccumulator::new();
        let mut receipts = HashMap::new();
        let mut last_produced = BTreeMap::new();
        for state in &states {
            ids.append(state.id);
            receipts.insert(state.id, self.receipts.get(&state.id).cloned().unwrap_or_default());
            last_produced.insert(state.header.header.producer.clone(), state.block_num);
        }
        Self {
            states,
            ids,
            receipts,
            queued: Vec::new(),
            proposal: None,
            last_produced,
            global_sequence: self.global_sequence,
            recv_sequence: self.recv_sequence.clone(),
            skip: 0,
        }
    }

    /// Ids of blocks `from..to`, the bridge a catch-up submission carries.
    pub fn id_path(&self, from: u32, to: u32) -> Vec<Hash> {
        (from..to)
            .filter_map(|num| self.state(num).map(|s| s.id))
            .collect()
    }

    /// Prove `receipt` against the blockroot of block `anchor_num`.
    pub fn prove_action(&self, receipt: &ActionReceipt, anchor_num: u32) -> Option<InclusionProof> {
        let (block_id, receipts) = self
            .receipts
            .iter()
            .find(|(_, receipts)| receipts.contains(receipt))?;
        let digests: Vec<Hash> = receipts.iter().map(ActionReceipt::digest).collect();
        let index = receipts.iter().position(|r| r == receipt)?;
        let block_num = self.ids.position_of(block_id)? + 1;
        let anchor = self.state(anchor_num)?;
        Some(InclusionProof {
            action_digest: receipt.digest(),
            action_path: merkle_path(&digests, index)?,
            block_id: *block_id,
            block_path: self.ids.prove(block_num - 1, u64::from(anchor_num) - 1)?,
            anchor_root: anchor.blockroot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::verify_inclusion;

    #[test]
    fn test_simulated_states_match_accumulator() {
        let mut chain = ChainSimulator::new(&["alpha", "beta", "gamma"]);
        chain.produce_blocks(40);
        for num in 2..=41 {
            let state = chain.state(num).unwrap();
            assert_eq!(Some(state.blockroot()), chain.ids.root_at(u64::from(num) - 1));
        }
    }

    #[test]
    fn test_prove_action_verifies() {
        let mut chain = ChainSimulator::new(&["alpha"]);
        let receiver = Name::new("relay").unwrap();
        let receipt = chain.push_action(&receiver, b"payload");
        chain.push_action(&receiver, b"other");
        let header = chain.produce_block();
        chain.produce_blocks(3);

        let proof = chain.prove_action(&receipt, 5).unwrap();
        assert_eq!(proof.block_id, header.id());
        verify_inclusion(&proof, &header.header.action_mroot, 4).unwrap();
    }

    #[test]
    fn test_fork_diverges_after_skip() {
        let mut chain = ChainSimulator::new(&["alpha"]);
        chain.produce_blocks(3);
        let mut fork = chain.fork_at(2);
        fork.skip_slots(1);
        let a = chain.produce_block();
        let b = fork.produce_block();
        assert_eq!(b.block_num(), 3);
        assert_ne!(a.block_num(), b.block_num());
        assert_ne!(chain.state(3).unwrap().id, fork.state(3).unwrap().id);
    }
}
