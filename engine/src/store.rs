//! Versioned, content-addressed committed state.
//!
//! `StateStore` is the boundary to the persistent storage engine. Every
//! committed version is identified by its Merkle root and never changes once
//! written. Working sets read from the version they were opened on and write
//! back through [`StateStore::apply_batch`].
//!
//! Implementations:
//! - [`MemStore`] (this module): in-memory versions for tests and tooling
//! - a trie-backed store supplied by the node

use std::collections::BTreeMap;
use std::sync::Arc;

use ledger_primitives::{
    codec::{write_u8, write_var_bytes},
    crypto::hash_blake3,
    Account, Address, ExecError, ExecResult, Hash, Hash160, StateTree, WriteBatch,
};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Abstraction over committed state storage.
///
/// Implementations must be deterministic: the same key always returns the
/// same value for a given root, and the same batch applied to the same base
/// always yields the same new root.
pub trait StateStore: Send + Sync {
    /// Root of the most recently committed version.
    fn root(&self) -> ExecResult<Hash>;

    /// Point lookup in the version identified by `root`.
    ///
    /// Returns `Ok(None)` if the key does not exist in that version.
    fn get(&self, root: &Hash, key: &Hash160) -> ExecResult<Option<Vec<u8>>>;

    /// Atomically apply `writes` on top of `base_root` and return the new root.
    ///
    /// Fails with `CommitConflict` if `base_root` is no longer the head. A
    /// retry of the batch that produced the current head from the same base
    /// returns that head again without applying anything twice.
    fn apply_batch(&self, base_root: &Hash, writes: &WriteBatch) -> ExecResult<Hash>;
}

/// Digest identifying a write batch, used to recognise retries.
pub fn batch_digest(writes: &WriteBatch) -> Hash {
    let mut buf = Vec::with_capacity(writes.len() * 32);
    for (key, value) in writes {
        buf.extend_from_slice(key);
        match value {
            Some(v) => {
                write_u8(&mut buf, 1);
                write_var_bytes(&mut buf, v);
            }
            None => write_u8(&mut buf, 0),
        }
    }
    hash_blake3(&buf)
}

#[derive(Debug, Clone, Copy)]
struct LastCommit {
    base: Hash,
    digest: Hash,
    root: Hash,
}

#[derive(Debug)]
struct Inner {
    head: Hash,
    versions: BTreeMap<Hash, Arc<StateTree>>,
    last_commit: Option<LastCommit>,
    unavailable: bool,
}

/// In-memory state store retaining every committed version.
///
/// Versions are never pruned, so memory grows with every distinct commit.
/// Meant for tests and single-process tooling, not long-running nodes.
#[derive(Debug)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create an empty store whose head is the empty-state root.
    pub fn new() -> Self {
        Self::with_tree(StateTree::new())
    }

    /// Create a store whose genesis version holds `accounts`.
    pub fn with_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (Address, Account)>,
    {
        let mut tree = StateTree::new();
        for (address, account) in accounts {
            tree.insert(address.state_key(), ledger_primitives::codec::encode_account(&account));
        }
        Self::with_tree(tree)
    }

    fn with_tree(tree: StateTree) -> Self {
        let head = tree.root();
        let mut versions = BTreeMap::new();
        versions.insert(head, Arc::new(tree));
        Self {
            inner: RwLock::new(Inner {
                head,
                versions,
                last_commit: None,
                unavailable: false,
            }),
        }
    }

    /// Simulate an I/O outage: all reads and commits fail with
    /// `StoreUnavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unavailable = unavailable;
    }

    /// Number of retained versions. Only grows: nothing is ever pruned.
    pub fn version_count(&self) -> usize {
        self.inner.read().versions.len()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable() -> ExecError {
    ExecError::StoreUnavailable("backend offline".into())
}

impl StateStore for MemStore {
    fn root(&self) -> ExecResult<Hash> {
        let inner = self.inner.read();
        if inner.unavailable {
            return Err(unavailable());
        }
        Ok(inner.head)
    }

    fn get(&self, root: &Hash, key: &Hash160) -> ExecResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        if inner.unavailable {
            return Err(unavailable());
        }
        let tree = inner.versions.get(root).ok_or_else(|| {
            ExecError::StoreUnavailable(format!(
                "unknown root {}",
                ledger_primitives::types::hash_to_hex(root)
            ))
        })?;
        Ok(tree.get(key).map(<[u8]>::to_vec))
    }

    fn apply_batch(&self, base_root: &Hash, writes: &WriteBatch) -> ExecResult<Hash> {
        let mut inner = self.inner.write();
        if inner.unavailable {
            return Err(unavailable());
        }

        let digest = batch_digest(writes);
        if *base_root != inner.head {
            if let Some(last) = inner.last_commit {
                if last.base == *base_root && last.digest == digest && last.root == inner.head {
                    debug!(root = ?last.root, "batch retry acknowledged without reapplying");
                    return Ok(last.root);
                }
            }
            warn!(
                base = ?base_root,
                head = ?inner.head,
                "rejecting commit against stale base root"
            );
            return Err(ExecError::CommitConflict {
                expected: *base_root,
                actual: inner.head,
            });
        }

        // Build the next version off to the side; the head only moves once
        // the whole batch is in place.
        let base = inner
            .versions
            .get(base_root)
            .cloned()
            .ok_or_else(|| ExecError::Corrupted("head version missing".into()))?;
        let mut next = StateTree::clone(&base);
        next.apply_writes(writes);
        let root = next.root();

        inner.versions.entry(root).or_insert_with(|| Arc::new(next));
        inner.head = root;
        inner.last_commit = Some(LastCommit {
            base: *base_root,
            digest,
            root,
        });
        debug!(root = ?root, writes = writes.len(), "batch applied");
        Ok(root)
    }
}
