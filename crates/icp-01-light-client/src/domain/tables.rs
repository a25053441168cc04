//! # Indexed Tables
//!
//! In-memory tables with explicit secondary indexes, one per logical table
//! of the fork store. Indexes are ordered sets of `(key, primary)` tuples so
//! range scans by number or parent stay O(log n + k).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use shared_types::Hash;

use super::entities::{BlockHeaderState, StoredBlock};

const MIN_HASH: Hash = [0u8; 32];
const MAX_HASH: Hash = [0xFFu8; 32];

// =============================================================================
// BLOCKS
// =============================================================================

/// `blocks` table: primary key is the block id.
#[derive(Debug, Clone, Default)]
pub struct BlockTable {
    rows: HashMap<Hash, StoredBlock>,
    by_num: BTreeSet<(u32, Hash)>,
    by_prev: BTreeSet<(Hash, Hash)>,
}

impl BlockTable {
    /// Insert a row; `false` if the id is already present.
    pub fn insert(&mut self, block: StoredBlock) -> bool {
        if self.rows.contains_key(&block.id) {
            return false;
        }
        self.by_num.insert((block.block_num, block.id));
        self.by_prev.insert((block.previous, block.id));
        self.rows.insert(block.id, block);
        true
    }

    /// Look up by id.
    pub fn get(&self, id: &Hash) -> Option<&StoredBlock> {
        self.rows.get(id)
    }

    /// Is the id stored?
    pub fn contains(&self, id: &Hash) -> bool {
        self.rows.contains_key(id)
    }

    /// Remove one row, leaving its children in place.
    pub fn remove(&mut self, id: &Hash) -> Option<StoredBlock> {
        let block = self.rows.remove(id)?;
        self.by_num.remove(&(block.block_num, block.id));
        self.by_prev.remove(&(block.previous, block.id));
        Some(block)
    }

    /// Ids whose parent is `previous`.
    pub fn children(&self, previous: &Hash) -> Vec<Hash> {
        self.by_prev
            .range((*previous, MIN_HASH)..=(*previous, MAX_HASH))
            .map(|(_, id)| *id)
            .collect()
    }

    /// Ids stored at a block number.
    pub fn ids_at(&self, block_num: u32) -> Vec<Hash> {
        self.by_num
            .range((block_num, MIN_HASH)..=(block_num, MAX_HASH))
            .map(|(_, id)| *id)
            .collect()
    }

    /// `(block_num, id)` of rows numbered `from..=to`.
    pub fn ids_between(&self, from: u32, to: u32) -> Vec<(u32, Hash)> {
        if from > to {
            return Vec::new();
        }
        self.by_num
            .range((from, MIN_HASH)..=(to, MAX_HASH))
            .copied()
            .collect()
    }

    /// Lowest-numbered row.
    pub fn oldest(&self) -> Option<(u32, Hash)> {
        self.by_num.first().copied()
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.by_num.clear();
        self.by_prev.clear();
    }
}

// =============================================================================
// BLOCK STATES
// =============================================================================

/// `block_states` table: auto-allocated primary key plus five indexes.
#[derive(Debug, Clone, Default)]
pub struct BlockStateTable {
    rows: BTreeMap<u64, BlockHeaderState>,
    next_pk: u64,
    by_id: HashMap<Hash, u64>,
    by_prev: BTreeSet<(Hash, u64)>,
    by_num: BTreeSet<(u32, u64)>,
    by_root: BTreeSet<(Hash, u64)>,
    /// `(lib, block_num, pk)`; the last entry is the best head.
    by_lib: BTreeSet<(u32, u32, u64)>,
}

impl BlockStateTable {
    /// Insert a state; `None` if its id is already present.
    pub fn insert(&mut self, state: BlockHeaderState) -> Option<u64> {
        if self.by_id.contains_key(&state.id) {
            return None;
        }
        let pk = self.next_pk;
        self.next_pk += 1;
        self.by_id.insert(state.id, pk);
        self.by_prev.insert((*state.previous(), pk));
        self.by_num.insert((state.block_num, pk));
        self.by_root.insert((state.blockroot(), pk));
        self.by_lib
            .insert((state.last_irreversible_blocknum(), state.block_num, pk));
        self.rows.insert(pk, state);
        Some(pk)
    }

    /// Look up by block id.
    pub fn get(&self, id: &Hash) -> Option<&BlockHeaderState> {
        self.by_id.get(id).and_then(|pk| self.rows.get(pk))
    }

    /// Is a state stored for the id?
    pub fn contains(&self, id: &Hash) -> bool {
        self.by_id.contains_key(id)
    }

    /// Remove by block id.
    pub fn remove(&mut self, id: &Hash) -> Option<BlockHeaderState> {
        let pk = self.by_id.remove(id)?;
        let state = self.rows.remove(&pk)?;
        self.by_prev.remove(&(*state.previous(), pk));
        self.by_num.remove(&(state.block_num, pk));
        self.by_root.remove(&(state.blockroot(), pk));
        self.by_lib
            .remove(&(state.last_irreversible_blocknum(), state.block_num, pk));
        Some(state)
    }

    /// States whose accumulator root equals `root`.
    ///
    /// Siblings share an ancestry and therefore a root, so several may match.
    pub fn with_root(&self, root: &Hash) -> impl Iterator<Item = &BlockHeaderState> {
        self.by_root
            .range((*root, 0)..=(*root, u64::MAX))
            .filter_map(|(_, pk)| self.rows.get(pk))
    }

    /// States at a block number.
    pub fn at_num(&self, block_num: u32) -> impl Iterator<Item = &BlockHeaderState> {
        self.by_num
            .range((block_num, 0)..=(block_num, u64::MAX))
            .filter_map(|(_, pk)| self.rows.get(pk))
    }

    /// States whose parent is `previous`.
    pub fn children(&self, previous: &Hash) -> impl Iterator<Item = &BlockHeaderState> {
        self.by_prev
            .range((*previous, 0)..=(*previous, u64::MAX))
            .filter_map(|(_, pk)| self.rows.get(pk))
    }

    /// Best head: highest LIB, then highest block number, then latest insert.
    pub fn head(&self) -> Option<&BlockHeaderState> {
        self.by_lib
            .last()
            .and_then(|(_, _, pk)| self.rows.get(pk))
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every row; primary keys keep increasing.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.by_id.clear();
        self.by_prev.clear();
        self.by_num.clear();
        self.by_root.clear();
        self.by_lib.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::id_with_num;

    fn block(num: u32, tag: u8, previous: Hash) -> StoredBlock {
        StoredBlock {
            id: id_with_num([tag; 32], num),
            block_num: num,
            previous,
            action_mroot: None,
        }
    }

    #[test]
    fn test_block_table_indexes() {
        let mut table = BlockTable::default();
        let a = block(1, 1, [0; 32]);
        let b = block(2, 2, a.id);
        let c = block(2, 3, a.id);
        assert!(table.insert(a.clone()));
        assert!(table.insert(b.clone()));
        assert!(table.insert(c.clone()));
        assert!(!table.insert(b.clone()));

        let mut children = table.children(&a.id);
        children.sort();
        let mut expected = vec![b.id, c.id];
        expected.sort();
        assert_eq!(children, expected);
        assert_eq!(table.ids_at(2).len(), 2);
        assert_eq!(table.ids_between(1, 1), vec![(1, a.id)]);
        assert_eq!(table.ids_between(2, 1), vec![]);
        assert_eq!(table.oldest(), Some((1, a.id)));
    }

    #[test]
    fn test_block_table_remove_keeps_children() {
        let mut table = BlockTable::default();
        let a = block(1, 1, [0; 32]);
        let b = block(2, 2, a.id);
        table.insert(a.clone());
        table.insert(b.clone());

        assert_eq!(table.remove(&a.id), Some(a.clone()));
        assert!(table.contains(&b.id));
        assert_eq!(table.oldest(), Some((2, b.id)));
        assert!(table.ids_at(1).is_empty());
    }

    #[test]
    fn test_block_table_clear() {
        let mut table = BlockTable::default();
        table.insert(block(1, 1, [0; 32]));
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.oldest(), None);
    }
}
