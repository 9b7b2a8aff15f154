//! Batch-scoped staging area over a committed state version.
//!
//! A `WorkingSet` is opened on the store's current root, buffers every write
//! made while a batch is handled, and lands them all at once on
//! [`WorkingSet::commit`]. Until then the store is untouched, so dropping or
//! discarding the working set after a fatal error has no visible effect.
//!
//! Handling takes `&mut WorkingSet`, so a single owner sequences all writes.

use std::collections::BTreeSet;
use std::sync::Arc;

use ledger_primitives::{
    codec, Account, ExecError, ExecResult, Hash, Hash160, OverlayResult, StateOverlay,
};
use tracing::debug;

use crate::store::StateStore;

/// A value that can be stored in state.
pub trait StateValue: Sized {
    fn encode_state(&self) -> Vec<u8>;
    fn decode_state(bytes: &[u8]) -> ExecResult<Self>;
}

impl StateValue for Account {
    fn encode_state(&self) -> Vec<u8> {
        codec::encode_account(self)
    }

    fn decode_state(bytes: &[u8]) -> ExecResult<Self> {
        codec::decode_account(bytes)
    }
}

/// Transaction-scoped overlay over one committed root.
pub struct WorkingSet {
    store: Arc<dyn StateStore>,
    base_root: Hash,
    overlay: StateOverlay,
    /// Root produced by a successful commit; a sealed working set accepts no
    /// further writes or commits.
    committed_root: Option<Hash>,
}

impl WorkingSet {
    /// Open a working set on the store's current head.
    pub fn new(store: Arc<dyn StateStore>) -> ExecResult<Self> {
        let base_root = store.root()?;
        Ok(Self::at_root(store, base_root))
    }

    /// Open a working set on a specific committed root.
    pub fn at_root(store: Arc<dyn StateStore>, base_root: Hash) -> Self {
        Self {
            store,
            base_root,
            overlay: StateOverlay::new(),
            committed_root: None,
        }
    }

    pub fn base_root(&self) -> Hash {
        self.base_root
    }

    /// Latest staged value for `key`, falling through to the base root.
    pub fn try_state(&mut self, key: &Hash160) -> ExecResult<Option<Vec<u8>>> {
        self.overlay.record_read(*key);
        match self.overlay.get(key) {
            OverlayResult::Found(value) => Ok(Some(value)),
            OverlayResult::Deleted => Ok(None),
            OverlayResult::NotInOverlay => self.store.get(&self.base_root, key),
        }
    }

    /// Like [`try_state`](Self::try_state), but absence is `StateNotFound`.
    pub fn state(&mut self, key: &Hash160) -> ExecResult<Vec<u8>> {
        self.try_state(key)?.ok_or(ExecError::StateNotFound(*key))
    }

    /// Decode the value stored under `key`, if any.
    ///
    /// Undecodable bytes mean committed state is damaged, so the error is
    /// reported as `Corrupted`.
    pub fn load<T: StateValue>(&mut self, key: &Hash160) -> ExecResult<Option<T>> {
        match self.try_state(key)? {
            Some(bytes) => T::decode_state(&bytes)
                .map(Some)
                .map_err(|e| ExecError::Corrupted(format!("key 0x{}: {}", hex::encode(key), e))),
            None => Ok(None),
        }
    }

    /// Stage a write. Never touches the store.
    pub fn put_state(&mut self, key: Hash160, value: Vec<u8>) -> ExecResult<()> {
        self.ensure_open()?;
        self.overlay.set(key, value);
        Ok(())
    }

    /// Stage an encoded value.
    pub fn put<T: StateValue>(&mut self, key: Hash160, value: &T) -> ExecResult<()> {
        self.put_state(key, value.encode_state())
    }

    /// Stage a tombstone for `key`.
    pub fn del_state(&mut self, key: Hash160) -> ExecResult<()> {
        self.ensure_open()?;
        self.overlay.delete(key);
        Ok(())
    }

    /// Keys read through this working set.
    pub fn read_set(&self) -> &BTreeSet<Hash160> {
        self.overlay.reads()
    }

    /// Number of keys with a staged write.
    pub fn dirty_len(&self) -> usize {
        self.overlay.len()
    }

    pub fn is_committed(&self) -> bool {
        self.committed_root.is_some()
    }

    /// Atomically apply every staged write and return the new root.
    ///
    /// Fails with `CommitConflict` if another commit advanced the store past
    /// `base_root`, or if this working set was already committed.
    pub fn commit(&mut self) -> ExecResult<Hash> {
        self.ensure_open()?;
        let root = self.store.apply_batch(&self.base_root, self.overlay.writes())?;
        debug!(
            base = ?self.base_root,
            root = ?root,
            writes = self.overlay.len(),
            reads = self.overlay.reads().len(),
            "working set committed"
        );
        self.committed_root = Some(root);
        Ok(root)
    }

    /// Drop all staged writes. The store is left untouched.
    pub fn discard(mut self) {
        debug!(base = ?self.base_root, writes = self.overlay.len(), "working set discarded");
        self.overlay.clear();
    }

    fn ensure_open(&self) -> ExecResult<()> {
        match self.committed_root {
            Some(root) => Err(ExecError::CommitConflict {
                expected: self.base_root,
                actual: root,
            }),
            None => Ok(()),
        }
    }
}
