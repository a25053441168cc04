//! # Incremental Merkle Tree
//!
//! Append-only accumulator over block ids, stored inside every block state.
//!
//! ## Algorithm
//!
//! Only the roots of perfect sub-trees ("peaks") are kept, tallest first.
//! Appending pushes a height-0 peak and merges equal-height neighbours, so an
//! append touches O(log n) nodes. The root of an imperfect tree pairs every
//! unmatched right-edge node with itself on the way up, which matches the
//! batch construction in `algorithms::merkle` exactly.
//!
//! ## Canonical pairs
//!
//! Node hashes carry their side in bit 7 of byte 0: cleared on a left
//! operand, set on a right one. Proof paths therefore need no separate
//! direction flags.
//!
//! Pairing overwrites that bit, so a leaf never enters a pair as-is: it is
//! first hashed into a leaf node (`sha256(0x00 ‖ leaf)`), which binds every
//! bit of the leaf to the root.

use serde::{Deserialize, Serialize};
use shared_crypto::sha256_many;
use shared_types::{Hash, ZERO_HASH};

const CANONICAL_FLAG: u8 = 0x80;

/// Leaf nodes hash 33 bytes, inner nodes 64: the two never collide.
const LEAF_TAG: [u8; 1] = [0x00];

/// Mark a digest as the left operand of a pair.
pub fn make_canonical_left(value: &Hash) -> Hash {
    let mut out = *value;
    out[0] &= !CANONICAL_FLAG;
    out
}

/// Mark a digest as the right operand of a pair.
pub fn make_canonical_right(value: &Hash) -> Hash {
    let mut out = *value;
    out[0] |= CANONICAL_FLAG;
    out
}

/// Does this digest carry the left-operand mark?
pub fn is_canonical_left(value: &Hash) -> bool {
    value[0] & CANONICAL_FLAG == 0
}

/// Does this digest carry the right-operand mark?
pub fn is_canonical_right(value: &Hash) -> bool {
    !is_canonical_left(value)
}

/// Tree node for a leaf digest.
pub fn hash_leaf(leaf: &Hash) -> Hash {
    sha256_many(&[&LEAF_TAG, leaf])
}

/// Parent of two nodes: `sha256(canonical_left(l) ‖ canonical_right(r))`.
pub fn hash_canonical_pair(left: &Hash, right: &Hash) -> Hash {
    sha256_many(&[&make_canonical_left(left), &make_canonical_right(right)])
}

/// A peak with its height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    /// Root of the perfect sub-tree
    pub hash: Hash,
    /// Sub-tree height (0 = single leaf)
    pub height: u32,
}

/// Compact incremental Merkle tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalMerkle {
    peaks: Vec<Peak>,
    leaf_count: u64,
}

impl IncrementalMerkle {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended leaves.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Current peaks, tallest first.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Append a leaf and return the new root.
    pub fn append(&mut self, leaf: Hash) -> Hash {
        self.peaks.push(Peak {
            hash: hash_leaf(&leaf),
            height: 0,
        });
        self.merge_peaks();
        self.leaf_count += 1;
        self.root()
    }

    /// Current root; the zero digest when empty.
    pub fn root(&self) -> Hash {
        let mut ascending = self.peaks.iter().rev();
        let Some(lowest) = ascending.next() else {
            return ZERO_HASH;
        };

        let mut acc = lowest.hash;
        let mut level = lowest.height;
        for peak in ascending {
            while level < peak.height {
                acc = hash_canonical_pair(&acc, &acc);
                level += 1;
            }
            acc = hash_canonical_pair(&peak.hash, &acc);
            level += 1;
        }
        acc
    }

    /// Peaks match the binary form of `leaf_count`.
    ///
    /// Snapshots arrive from untrusted relayers, so shape is checked before
    /// any root comparison.
    pub fn is_well_formed(&self) -> bool {
        let expected: Vec<u32> = (0..u64::BITS)
            .rev()
            .filter(|bit| self.leaf_count & (1u64 << bit) != 0)
            .collect();
        self.peaks.len() == expected.len()
            && self
                .peaks
                .iter()
                .zip(expected)
                .all(|(peak, height)| peak.height == height)
    }

    fn merge_peaks(&mut self) {
        while let [.., left, right] = self.peaks.as_slice() {
            if left.height != right.height {
                break;
            }
            let merged = Peak {
                hash: hash_canonical_pair(&left.hash, &right.hash),
                height: left.height + 1,
            };
            self.peaks.truncate(self.peaks.len() - 2);
            self.peaks.push(merged);
        }
    }
}
