//! Transactional state overlay.
//!
//! The overlay buffers writes made while handling a batch and makes them
//! visible to later reads of the same batch. It also records which keys
//! were read, so a driver can reason about what the batch depended on.
//!
//! Both maps are `BTree`-based so iteration order is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::Hash160;

/// Buffered writes: key → Some(value) for sets, key → None for tombstones.
pub type WriteBatch = BTreeMap<Hash160, Option<Vec<u8>>>;

/// Transactional write buffer overlaying committed state.
#[derive(Debug, Clone, Default)]
pub struct StateOverlay {
    writes: WriteBatch,
    reads: BTreeSet<Hash160>,
}

/// Result of looking up a key in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayResult {
    /// Key was found in the overlay with this value.
    Found(Vec<u8>),
    /// Key was explicitly deleted in this overlay.
    Deleted,
    /// Key is not in the overlay; the caller must check committed state.
    NotInOverlay,
}

impl StateOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key-value pair, replacing any earlier entry for the key.
    pub fn set(&mut self, key: Hash160, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    /// Mark a key as deleted. Later reads return `Deleted` rather than
    /// falling through to committed state.
    pub fn delete(&mut self, key: Hash160) {
        self.writes.insert(key, None);
    }

    /// Look up a key in the overlay.
    pub fn get(&self, key: &Hash160) -> OverlayResult {
        match self.writes.get(key) {
            Some(Some(value)) => OverlayResult::Found(value.clone()),
            Some(None) => OverlayResult::Deleted,
            None => OverlayResult::NotInOverlay,
        }
    }

    /// Record that `key` was read by the batch.
    pub fn record_read(&mut self, key: Hash160) {
        self.reads.insert(key);
    }

    pub fn contains_key(&self, key: &Hash160) -> bool {
        self.writes.contains_key(key)
    }

    /// Buffered writes in key order.
    pub fn writes(&self) -> &WriteBatch {
        &self.writes
    }

    /// Keys read so far, in key order.
    pub fn reads(&self) -> &BTreeSet<Hash160> {
        &self.reads
    }

    /// Clear all buffered writes and reads. Used when discarding on failure.
    pub fn clear(&mut self) {
        self.writes.clear();
        self.reads.clear();
    }

    /// Number of keys touched (set or deleted).
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
