//! # Merkle Proof Verification
//!
//! Batch Merkle roots and paths over canonical pairs, and path verification.
//!
//! Used for action roots (built per block from receipt digests) and for
//! checking block paths against accumulator roots.

use shared_types::{Hash, ZERO_HASH};

use crate::domain::{
    hash_canonical_pair, hash_leaf, is_canonical_left, is_canonical_right, make_canonical_left,
    make_canonical_right,
};

/// Root over `leaves`; odd levels pair the last node with itself.
///
/// # Time Complexity: O(n)
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash> = leaves.iter().map(hash_leaf).collect();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Canonical path for `leaves[index]`, or `None` if out of range.
pub fn merkle_path(leaves: &[Hash], index: usize) -> Option<Vec<Hash>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level: Vec<Hash> = leaves.iter().map(hash_leaf).collect();
    let mut index = index;

    while level.len() > 1 {
        let sibling = if index % 2 == 0 {
            // Unpaired last node is its own right sibling.
            let right = level.get(index + 1).unwrap_or(&level[index]);
            make_canonical_right(right)
        } else {
            make_canonical_left(&level[index - 1])
        };
        path.push(sibling);
        level = next_level(&level);
        index /= 2;
    }

    Some(path)
}

/// Rebuild the root from a leaf and a canonical path.
///
/// `None` for a left sibling equal to the node it pairs with: unpaired
/// nodes are only ever duplicated to the right.
pub fn compute_root_from_path(leaf: &Hash, path: &[Hash]) -> Option<Hash> {
    path.iter().try_fold(hash_leaf(leaf), |current, sibling| {
        if is_canonical_left(sibling) {
            (make_canonical_left(&current) != *sibling)
                .then(|| hash_canonical_pair(sibling, &current))
        } else {
            Some(hash_canonical_pair(&current, sibling))
        }
    })
}

/// Verify a canonical path.
///
/// # Algorithm
///
/// 1. Start with the leaf node as current hash
/// 2. For each sibling, its flag bit says which side it sits on
/// 3. Final hash should equal `root`
///
/// # Time Complexity: O(log n)
pub fn verify_merkle_path(leaf: &Hash, path: &[Hash], root: &Hash) -> bool {
    compute_root_from_path(leaf, path) == Some(*root)
}

/// Path length for a tree of `leaf_count` leaves: ⌈log2 n⌉.
pub fn path_length(leaf_count: u64) -> usize {
    if leaf_count <= 1 {
        return 0;
    }
    leaf_count.next_power_of_two().trailing_zeros() as usize
}

/// Verify a path for a known leaf position in a tree of known size.
///
/// Fails closed on a wrong path length or a sibling flagged on the wrong
/// side for `index`, even if the digests happen to reproduce `root`.
pub fn verify_at(leaf: &Hash, index: u64, leaf_count: u64, path: &[Hash], root: &Hash) -> bool {
    if index >= leaf_count || path.len() != path_length(leaf_count) {
        return false;
    }
    let directions_match = path.iter().enumerate().all(|(level, sibling)| {
        if (index >> level) & 1 == 0 {
            is_canonical_right(sibling)
        } else {
            is_canonical_left(sibling)
        }
    });
    directions_match && verify_merkle_path(leaf, path, root)
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_canonical_pair(left, right)
        })
        .collect()
}
