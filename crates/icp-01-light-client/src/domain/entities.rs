//! # Domain Entities
//!
//! Block headers, producer schedules and the derived per-block state the
//! fork store persists.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{sha256_many, DigestWriter};
use shared_types::{BlockTimestamp, Hash, Name, PublicKey, Signature, ZERO_HASH};

use super::errors::LightClientError;
use super::incremental_merkle::IncrementalMerkle;
use super::value_objects::{
    id_with_num, num_from_id, required_confirmations, MAX_PRODUCERS, PRODUCER_REPETITIONS,
};

// =============================================================================
// PRODUCER SCHEDULES
// =============================================================================

/// A producer and the key it signs blocks with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerKey {
    /// Producer account.
    pub producer_name: Name,
    /// Block signing key.
    pub block_signing_key: PublicKey,
}

/// Versioned, ordered producer set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSchedule {
    /// Monotonic schedule version.
    pub version: u32,
    /// Producers in slot order.
    pub producers: Vec<ProducerKey>,
}

impl ProducerSchedule {
    /// Feed the canonical encoding into a digest.
    pub fn write_to(&self, writer: &mut DigestWriter) {
        writer.u32(self.version).u32(self.producers.len() as u32);
        for producer in &self.producers {
            writer
                .bytes(&producer.producer_name.to_canonical_bytes())
                .bytes(&producer.block_signing_key);
        }
    }

    /// Digest committed by the header that proposes this schedule.
    pub fn digest(&self) -> Hash {
        let mut writer = DigestWriter::new();
        self.write_to(&mut writer);
        writer.finish()
    }

    /// Signing key for a producer, if scheduled.
    pub fn key_of(&self, producer: &Name) -> Option<&PublicKey> {
        self.producers
            .iter()
            .find(|p| &p.producer_name == producer)
            .map(|p| &p.block_signing_key)
    }

    /// Producer owning the slot: each producer holds 12 consecutive slots.
    pub fn scheduled_producer(&self, timestamp: BlockTimestamp) -> Option<&ProducerKey> {
        let count = self.producers.len() as u64;
        if count == 0 {
            return None;
        }
        let round = count * u64::from(PRODUCER_REPETITIONS);
        let index = (u64::from(timestamp.slot()) % round) / u64::from(PRODUCER_REPETITIONS);
        self.producers.get(index as usize)
    }

    /// Non-empty, bounded, no duplicate producers.
    pub fn validate(&self) -> Result<(), LightClientError> {
        if self.producers.is_empty() {
            return Err(LightClientError::InvalidSchedule("empty producer set".into()));
        }
        if self.producers.len() > MAX_PRODUCERS {
            return Err(LightClientError::InvalidSchedule(format!(
                "{} producers exceeds maximum {MAX_PRODUCERS}",
                self.producers.len()
            )));
        }
        let unique: BTreeSet<&Name> = self.producers.iter().map(|p| &p.producer_name).collect();
        if unique.len() != self.producers.len() {
            return Err(LightClientError::InvalidSchedule("duplicate producer".into()));
        }
        Ok(())
    }
}

/// A proposed schedule waiting for its proposing block to become irreversible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSchedule {
    /// Number of the proposing block; promotion once LIB reaches it.
    pub lib_num: u32,
    /// Digest of `schedule`.
    pub hash: Hash,
    /// The proposed schedule.
    pub schedule: ProducerSchedule,
}

// =============================================================================
// HEADERS
// =============================================================================

/// Peer-chain block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Slot the block was produced in.
    pub timestamp: BlockTimestamp,
    /// Producing account.
    pub producer: Name,
    /// Number of preceding blocks this producer confirms.
    pub confirmed: u16,
    /// Id of the parent block.
    pub previous: Hash,
    /// Root of the block's transactions.
    pub transaction_mroot: Hash,
    /// Root of the block's action receipts.
    pub action_mroot: Hash,
    /// Version of the schedule this block was produced under.
    pub schedule_version: u32,
    /// Schedule proposal carried by this block.
    pub new_producers: Option<ProducerSchedule>,
    /// Opaque `(type, data)` extensions.
    pub header_extensions: Vec<(u16, Vec<u8>)>,
}

impl BlockHeader {
    /// Digest of the canonical encoding.
    pub fn digest(&self) -> Hash {
        let mut writer = DigestWriter::new();
        writer
            .u32(self.timestamp.slot())
            .bytes(&self.producer.to_canonical_bytes())
            .u16(self.confirmed)
            .bytes(&self.previous)
            .bytes(&self.transaction_mroot)
            .bytes(&self.action_mroot)
            .u32(self.schedule_version);
        match &self.new_producers {
            Some(schedule) => {
                writer.flag(true);
                schedule.write_to(&mut writer);
            }
            None => {
                writer.flag(false);
            }
        }
        writer.u32(self.header_extensions.len() as u32);
        for (kind, data) in &self.header_extensions {
            writer.u16(*kind).var_bytes(data);
        }
        writer.finish()
    }

    /// One past the number embedded in `previous`.
    pub fn block_num(&self) -> u32 {
        num_from_id(&self.previous).wrapping_add(1)
    }

    /// Digest with the block number stamped into its first four bytes.
    pub fn id(&self) -> Hash {
        id_with_num(self.digest(), self.block_num())
    }
}

/// Header plus the producer's signature.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlockHeader {
    /// Signed header.
    pub header: BlockHeader,
    /// Ed25519 signature over the state's `sig_digest`.
    #[serde_as(as = "Bytes")]
    pub producer_signature: Signature,
}

impl SignedBlockHeader {
    /// Block id.
    pub fn id(&self) -> Hash {
        self.header.id()
    }

    /// Block number.
    pub fn block_num(&self) -> u32 {
        self.header.block_num()
    }
}

// =============================================================================
// BLOCK HEADER STATE
// =============================================================================

/// A validated header plus the consensus metadata derived from its ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderState {
    /// Block id.
    pub id: Hash,
    /// Block number.
    pub block_num: u32,
    /// The signed header.
    pub header: SignedBlockHeader,
    /// Highest block that gathered enough confirmations on this branch.
    pub proposed_irreversible_blocknum: u32,
    /// Irreversibility implied by 2/3+1 of the active producers.
    pub consensus_irreversible_blocknum: u32,
    /// Irreversibility carried from the trusted seed.
    pub fallback_irreversible_blocknum: u32,
    /// Proposed schedule awaiting promotion.
    pub pending_schedule: Option<PendingSchedule>,
    /// Schedule this block was produced under.
    pub active_schedule: ProducerSchedule,
    /// Accumulator over the ids of all ancestors (not this block).
    pub blockroot_merkle: IncrementalMerkle,
    /// Last block number each active producer signed.
    pub producer_to_last_produced: BTreeMap<Name, u32>,
    /// Irreversible block implied by each producer's last block.
    pub producer_to_last_implied_irb: BTreeMap<Name, u32>,
    /// Key that signed this block.
    pub block_signing_key: PublicKey,
    /// Outstanding confirmations for the trailing blocks, oldest first.
    pub confirm_count: Vec<u8>,
}

impl BlockHeaderState {
    /// Build the state of a chain's first block (number 1).
    pub fn genesis(
        header: SignedBlockHeader,
        schedule: ProducerSchedule,
    ) -> Result<Self, LightClientError> {
        schedule.validate()?;
        if header.block_num() != 1 || header.header.previous != ZERO_HASH {
            return Err(LightClientError::InvalidHeader(
                "genesis header must have a zero previous id".into(),
            ));
        }
        let producer = header.header.producer.clone();
        let block_signing_key = *schedule.key_of(&producer).ok_or_else(|| {
            LightClientError::InvalidHeader(format!("{producer} is not in the genesis schedule"))
        })?;
        Ok(Self {
            id: header.id(),
            block_num: 1,
            header,
            proposed_irreversible_blocknum: 1,
            consensus_irreversible_blocknum: 1,
            fallback_irreversible_blocknum: 1,
            pending_schedule: None,
            active_schedule: schedule,
            blockroot_merkle: IncrementalMerkle::new(),
            producer_to_last_produced: BTreeMap::from([(producer.clone(), 1)]),
            producer_to_last_implied_irb: BTreeMap::from([(producer, 1)]),
            block_signing_key,
            confirm_count: Vec::new(),
        })
    }

    /// Parent block id.
    pub fn previous(&self) -> &Hash {
        &self.header.header.previous
    }

    /// Effective LIB: the larger of the two irreversibility counters.
    pub fn last_irreversible_blocknum(&self) -> u32 {
        self.consensus_irreversible_blocknum
            .max(self.fallback_irreversible_blocknum)
    }

    /// Digest of the pending schedule, zero when none.
    pub fn pending_schedule_hash(&self) -> Hash {
        self.pending_schedule
            .as_ref()
            .map_or(ZERO_HASH, |pending| pending.hash)
    }

    /// Root of `blockroot_merkle`.
    pub fn blockroot(&self) -> Hash {
        self.blockroot_merkle.root()
    }

    /// Digest the producer signs: header, ancestry root and pending schedule.
    pub fn sig_digest(&self) -> Hash {
        let header_bmroot = sha256_many(&[&self.header.header.digest(), &self.blockroot()]);
        sha256_many(&[&header_bmroot, &self.pending_schedule_hash()])
    }

    /// Confirmations each new block starts with under the active schedule.
    pub fn required_confirmations(&self) -> usize {
        required_confirmations(self.active_schedule.producers.len())
    }
}

// =============================================================================
// STORE RECORDS
// =============================================================================

/// Row of the `blocks` table: every id the store can link or prove against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    /// Block id.
    pub id: Hash,
    /// Block number.
    pub block_num: u32,
    /// Parent id.
    pub previous: Hash,
    /// Action root, absent for ids bridged by a merkle path.
    pub action_mroot: Option<Hash>,
}

/// Retained-record cap for the `blocks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeter {
    /// Cap on retained block records.
    pub max_blocks: u32,
    /// Records currently retained.
    pub current_blocks: u32,
}

impl StoreMeter {
    /// Is the cap exceeded?
    pub fn over_capacity(&self) -> bool {
        self.current_blocks > self.max_blocks
    }
}
