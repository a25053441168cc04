//! # Merkle Accumulator
//!
//! Full-history append-only Merkle store over block ids.
//!
//! Where [`IncrementalMerkle`] keeps only peaks, the accumulator keeps every
//! complete node so it can produce a path for any leaf against the root of
//! any earlier prefix. Proofs built against an old root stay valid forever:
//! appends never rewrite complete nodes.

use std::collections::HashMap;

use shared_types::{Hash, ZERO_HASH};

use super::merkle::verify_merkle_path;
use crate::domain::{
    hash_canonical_pair, hash_leaf, make_canonical_left, make_canonical_right, IncrementalMerkle,
};

/// Append-only Merkle store with historical roots and proofs.
#[derive(Debug, Clone, Default)]
pub struct MerkleAccumulator {
    /// `levels[0]` are leaf nodes; `levels[k]` holds complete height-k nodes.
    levels: Vec<Vec<Hash>>,
    /// Peaks for O(log n) current root.
    frontier: IncrementalMerkle,
    /// Leaf → position.
    leaf_index: HashMap<Hash, u64>,
    /// Root → number of leaves it covers.
    root_index: HashMap<Hash, u64>,
}

impl MerkleAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.frontier.leaf_count()
    }

    /// Current root.
    pub fn root(&self) -> Hash {
        self.frontier.root()
    }

    /// Compact snapshot matching this accumulator.
    pub fn snapshot(&self) -> &IncrementalMerkle {
        &self.frontier
    }

    /// Append a leaf and return the new root.
    ///
    /// # Time Complexity: O(log n)
    pub fn append(&mut self, leaf: Hash) -> Hash {
        let position = self.leaf_count();
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(hash_leaf(&leaf));

        let mut level = 0;
        while self.levels[level].len() % 2 == 0 {
            let nodes = &self.levels[level];
            let parent = hash_canonical_pair(&nodes[nodes.len() - 2], &nodes[nodes.len() - 1]);
            if self.levels.len() == level + 1 {
                self.levels.push(Vec::new());
            }
            self.levels[level + 1].push(parent);
            level += 1;
        }

        let root = self.frontier.append(leaf);
        self.leaf_index.entry(leaf).or_insert(position);
        self.root_index.insert(root, position + 1);
        root
    }

    /// Position of a leaf, if appended.
    pub fn position_of(&self, leaf: &Hash) -> Option<u64> {
        self.leaf_index.get(leaf).copied()
    }

    /// Number of leaves covered by a historical root.
    pub fn count_at_root(&self, root: &Hash) -> Option<u64> {
        self.root_index.get(root).copied()
    }

    /// Root after the first `count` leaves.
    pub fn root_at(&self, count: u64) -> Option<Hash> {
        if count == 0 {
            return Some(ZERO_HASH);
        }
        self.right_edge(count)?.last().copied()
    }

    /// Path for leaf `index` against the root of the first `count` leaves.
    pub fn prove(&self, index: u64, count: u64) -> Option<Vec<Hash>> {
        if index >= count {
            return None;
        }
        let edge = self.right_edge(count)?;
        let last = count - 1;

        let mut path = Vec::with_capacity(edge.len().saturating_sub(1));
        let mut level = 0usize;
        while (last >> level) > 0 {
            let node = index >> level;
            let last_node = last >> level;
            let sibling_pos = node ^ 1;
            let sibling = if sibling_pos < last_node {
                *self.levels.get(level)?.get(sibling_pos as usize)?
            } else {
                // Either the partial right-edge node or, for an unpaired
                // right-edge node, the node itself.
                edge[level]
            };
            path.push(if node % 2 == 0 {
                make_canonical_right(&sibling)
            } else {
                make_canonical_left(&sibling)
            });
            level += 1;
        }
        Some(path)
    }

    /// Path for `leaf` against a root this accumulator has produced.
    pub fn prove_membership(&self, leaf: &Hash, at_root: &Hash) -> Option<Vec<Hash>> {
        let count = self.count_at_root(at_root)?;
        let index = self.position_of(leaf)?;
        self.prove(index, count)
    }

    /// Check a path against a root.
    pub fn verify(leaf: &Hash, path: &[Hash], root: &Hash) -> bool {
        verify_merkle_path(leaf, path, root)
    }

    /// Right-edge node at every level for a prefix, bottom to root.
    fn right_edge(&self, count: u64) -> Option<Vec<Hash>> {
        if count == 0 || count > self.leaf_count() {
            return None;
        }
        let last = count - 1;
        let mut current = *self.levels.first()?.get(last as usize)?;
        let mut edge = vec![current];
        let mut level = 0usize;
        while (last >> level) > 0 {
            let node = last >> level;
            current = if node % 2 == 1 {
                let left = self.levels.get(level)?.get(node as usize - 1)?;
                hash_canonical_pair(left, &current)
            } else {
                hash_canonical_pair(&current, &current)
            };
            edge.push(current);
            level += 1;
        }
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::merkle::{merkle_root, verify_at};

    fn leaf(n: u64) -> Hash {
        let mut h = [0u8; 32];
        h[..8].copy_from_slice(&n.to_be_bytes());
        h[31] = 0xEE;
        h
    }

    fn build(n: u64) -> MerkleAccumulator {
        let mut acc = MerkleAccumulator::new();
        for i in 0..n {
            acc.append(leaf(i));
        }
        acc
    }

    #[test]
    fn test_roots_match_batch_and_incremental() {
        let acc = build(40);
        let leaves: Vec<Hash> = (0..40).map(leaf).collect();
        for count in 1..=40u64 {
            assert_eq!(
                acc.root_at(count),
                Some(merkle_root(&leaves[..count as usize])),
                "count = {count}"
            );
        }
        assert_eq!(acc.root(), acc.root_at(40).unwrap());
        assert_eq!(acc.root_at(0), Some(ZERO_HASH));
        assert_eq!(acc.root_at(41), None);
    }

    #[test]
    fn test_old_proofs_survive_appends() {
        let mut acc = build(11);
        let old_root = acc.root();
        let old_path = acc.prove_membership(&leaf(4), &old_root).unwrap();

        for i in 11..50 {
            acc.append(leaf(i));
        }
        assert!(MerkleAccumulator::verify(&leaf(4), &old_path, &old_root));
        assert_eq!(acc.prove_membership(&leaf(4), &old_root), Some(old_path));
    }

    #[test]
    fn test_every_prefix_every_leaf_strict() {
        let acc = build(23);
        for count in 1..=23u64 {
            let root = acc.root_at(count).unwrap();
            for index in 0..count {
                let path = acc.prove(index, count).unwrap();
                assert!(
                    verify_at(&leaf(index), index, count, &path, &root),
                    "index {index} of {count}"
                );
            }
        }
    }

    #[test]
    fn test_leaf_after_prefix_not_provable() {
        let acc = build(8);
        let root5 = acc.root_at(5).unwrap();
        assert!(acc.prove_membership(&leaf(6), &root5).is_none());
        assert!(acc.prove(5, 5).is_none());
    }

    #[test]
    fn test_unknown_root_not_provable() {
        let acc = build(4);
        assert!(acc.prove_membership(&leaf(1), &[0xAB; 32]).is_none());
    }
}
