//! Ordered key-value storage behind a catalog.

use std::{
    collections::BTreeMap,
    ops::{Bound, ControlFlow},
    sync::{Arc, RwLock},
};

use crate::error::StoreError;

/// A stored value and its one-byte metadata field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StoredEntry {
    /// Flags attached to the entry.
    pub meta: u8,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl StoredEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(meta: u8, value: Vec<u8>) -> Self {
        Self { meta, value }
    }
}

/// Writes staged inside [`CatalogStore::transact`].
pub trait StoreTxn {
    /// Reads `key`, observing writes already staged in this transaction.
    fn get(&self, key: &[u8]) -> Option<StoredEntry>;

    /// Stages a write of `entry` under `key`.
    fn set(&mut self, key: Vec<u8>, entry: StoredEntry);
}

/// The ordered key-value contract a catalog is built on.
///
/// Keys order bytewise. Missing keys are `Ok(None)`, never errors.
pub trait CatalogStore: Send + Sync {
    /// Reads `key`.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend fails.
    fn get(&self, key: &[u8]) -> Result<Option<StoredEntry>, StoreError>;

    /// Writes `entry` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend fails.
    fn set(&self, key: &[u8], entry: StoredEntry) -> Result<(), StoreError>;

    /// Visits every key starting with `prefix` in ascending order until
    /// `visit` breaks.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend fails.
    fn seek(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &StoredEntry) -> ControlFlow<()>,
    ) -> Result<(), StoreError>;

    /// Runs `apply` against a transaction whose writes become visible
    /// together once it returns.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend fails; no staged write is
    /// applied in that case.
    fn transact(&self, apply: &mut dyn FnMut(&mut dyn StoreTxn)) -> Result<(), StoreError>;
}

impl<T: CatalogStore + ?Sized> CatalogStore for &T {
    fn get(&self, key: &[u8]) -> Result<Option<StoredEntry>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], entry: StoredEntry) -> Result<(), StoreError> {
        (**self).set(key, entry)
    }

    fn seek(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &StoredEntry) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        (**self).seek(prefix, visit)
    }

    fn transact(&self, apply: &mut dyn FnMut(&mut dyn StoreTxn)) -> Result<(), StoreError> {
        (**self).transact(apply)
    }
}

impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<StoredEntry>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], entry: StoredEntry) -> Result<(), StoreError> {
        (**self).set(key, entry)
    }

    fn seek(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &StoredEntry) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        (**self).seek(prefix, visit)
    }

    fn transact(&self, apply: &mut dyn FnMut(&mut dyn StoreTxn)) -> Result<(), StoreError> {
        (**self).transact(apply)
    }
}

/// An in-memory [`CatalogStore`] over a `BTreeMap`.
///
/// # Examples
/// ```
/// use fine2x3_core::{CatalogStore, MemoryStore, StoredEntry};
///
/// let store = MemoryStore::new();
/// store.set(b"ab", StoredEntry::new(1, vec![7]))?;
/// assert_eq!(store.get(b"ab")?.map(|entry| entry.meta), Some(1));
/// assert_eq!(store.get(b"zz")?, None);
/// # Ok::<(), fine2x3_core::StoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// # Errors
    /// Returns [`StoreError::Poisoned`] when a writer panicked.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Returns `true` when nothing is stored.
    ///
    /// # Errors
    /// Returns [`StoreError::Poisoned`] when a writer panicked.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl CatalogStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StoredEntry>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &[u8], entry: StoredEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_vec(), entry);
        Ok(())
    }

    fn seek(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &StoredEntry) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let range = entries.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for (key, entry) in range {
            if !key.starts_with(prefix) || visit(key, entry).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn transact(&self, apply: &mut dyn FnMut(&mut dyn StoreTxn)) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let mut txn = MemoryTxn {
            committed: &entries,
            staged: BTreeMap::new(),
        };
        apply(&mut txn);
        let staged = txn.staged;
        entries.extend(staged);
        Ok(())
    }
}

struct MemoryTxn<'a> {
    committed: &'a BTreeMap<Vec<u8>, StoredEntry>,
    staged: BTreeMap<Vec<u8>, StoredEntry>,
}

impl StoreTxn for MemoryTxn<'_> {
    fn get(&self, key: &[u8]) -> Option<StoredEntry> {
        self.staged
            .get(key)
            .or_else(|| self.committed.get(key))
            .cloned()
    }

    fn set(&mut self, key: Vec<u8>, entry: StoredEntry) {
        self.staged.insert(key, entry);
    }
}
