//! Merkle commitment over the full key/value state.
//!
//! All entries are sorted by key, hashed as leaves, then combined pairwise
//! into a binary tree. The same set of entries always yields the same root,
//! regardless of the order in which writes were applied.

use std::collections::BTreeMap;

use crate::crypto::hash_blake3;
use crate::state::WriteBatch;
use crate::types::{Hash, Hash160, ZERO_HASH};

/// Domain separator for leaf nodes.
const LEAF_PREFIX: u8 = 0x00;
/// Domain separator for internal nodes.
const INTERNAL_PREFIX: u8 = 0x01;

/// One immutable-by-convention version of the state, with its root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTree {
    entries: BTreeMap<Hash160, Vec<u8>>,
}

impl StateTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Hash160, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &Hash160) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a batch of writes: `Some(value)` = set, `None` = delete.
    pub fn apply_writes(&mut self, writes: &WriteBatch) {
        for (key, value) in writes {
            match value {
                Some(v) => {
                    self.entries.insert(*key, v.clone());
                }
                None => {
                    self.entries.remove(key);
                }
            }
        }
    }

    /// Compute the deterministic Merkle root. An empty tree has `ZERO_HASH`.
    pub fn root(&self) -> Hash {
        let leaves: Vec<Hash> = self
            .entries
            .iter()
            .map(|(k, v)| hash_leaf(k, v))
            .collect();
        compute_root_from_leaves(&leaves)
    }
}

/// H(LEAF_PREFIX || key || value)
fn hash_leaf(key: &Hash160, value: &[u8]) -> Hash {
    let mut data = Vec::with_capacity(1 + key.len() + value.len());
    data.push(LEAF_PREFIX);
    data.extend_from_slice(key);
    data.extend_from_slice(value);
    hash_blake3(&data)
}

/// H(INTERNAL_PREFIX || left || right)
fn hash_internal(left: &Hash, right: &Hash) -> Hash {
    let mut data = [0u8; 1 + 32 + 32];
    data[0] = INTERNAL_PREFIX;
    data[1..33].copy_from_slice(left);
    data[33..65].copy_from_slice(right);
    hash_blake3(&data)
}

/// Combine leaves level by level; an odd trailing node is promoted.
fn compute_root_from_leaves(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }

    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_internal(left, right),
                _ => pair[0],
            })
            .collect();
    }
    level[0]
}
