//! Byte Budget Store Module
//!
//! Flat key to serialized-document storage with a byte ceiling, a used-space
//! counter and an owner identity gate.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::{estimate_size, Record, StoreStats, DEFAULT_BUDGET_BYTES, MAX_BUDGET_BYTES};

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug)]
struct Slot {
    /// JSON text of the stored value
    serialized: String,
    /// Bytes this entry accounts for in `space_used`
    size: usize,
}

#[derive(Debug)]
struct Inner {
    entries: BTreeMap<String, Slot>,
    /// Invariant: equals the sum of all slot sizes and never exceeds `budget`
    space_used: usize,
    budget: usize,
    owner: Option<Uuid>,
}

// == Byte Budget Store ==
/// Key to JSON document storage bounded by a byte budget.
///
/// Every mutation checks and commits the used-space counter under one
/// exclusive lock. Callers that read-modify-write a single key serialize
/// on [`ByteBudgetStore::key_lock`].
#[derive(Debug)]
pub struct ByteBudgetStore {
    inner: RwLock<Inner>,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
    stats: Mutex<StoreStats>,
}

impl Default for ByteBudgetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBudgetStore {
    // == Constructor ==
    /// Creates an empty store with the default 5 MiB budget.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: BTreeMap::new(),
                space_used: 0,
                budget: DEFAULT_BUDGET_BYTES,
                owner: None,
            }),
            key_locks: DashMap::new(),
            stats: Mutex::new(StoreStats::new()),
        }
    }

    /// Creates an empty store with a custom budget.
    pub fn with_budget(bytes: usize) -> Result<Self> {
        let store = Self::new();
        store.set_budget(bytes)?;
        Ok(store)
    }

    // == Set Budget ==
    /// Reconfigures the byte ceiling.
    ///
    /// Fails if `bytes` is zero, above [`MAX_BUDGET_BYTES`], or below the
    /// space already in use.
    pub fn set_budget(&self, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Err(StoreError::Config(
                "Budget must be a positive number of bytes".to_string(),
            ));
        }
        if bytes > MAX_BUDGET_BYTES {
            return Err(StoreError::Config(format!(
                "Budget cannot exceed the maximum of {} bytes",
                MAX_BUDGET_BYTES
            )));
        }

        let mut inner = self.inner.write();
        if bytes < inner.space_used {
            return Err(StoreError::Config(format!(
                "Budget of {} bytes is below the {} bytes already in use",
                bytes, inner.space_used
            )));
        }
        inner.budget = bytes;
        Ok(())
    }

    // == Owner ==
    /// Binds the owning session identity. Required before the first write.
    pub fn set_owner(&self, id: Uuid) {
        self.inner.write().owner = Some(id);
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.inner.read().owner
    }

    // == Get ==
    /// Retrieves and deserializes the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let inner = self.inner.read();
        let slot = inner
            .entries
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(serde_json::from_str(&slot.serialized)?)
    }

    // == Put ==
    /// Stores a value under `key`, returning its accounted size.
    ///
    /// Replacing an existing key releases the old entry's size in the same
    /// step. A write that would exceed the budget leaves the store untouched.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<usize> {
        let serialized = serde_json::to_string(value)?;
        let size = serialized.len();

        let mut inner = self.inner.write();
        if inner.owner.is_none() {
            return Err(StoreError::NotBound);
        }

        let previous = inner.entries.get(key).map_or(0, |slot| slot.size);
        let base = inner.space_used - previous;
        if base + size > inner.budget {
            return Err(StoreError::Capacity {
                requested: size,
                available: inner.budget - base,
            });
        }

        inner
            .entries
            .insert(key.to_string(), Slot { serialized, size });
        inner.space_used = base + size;
        debug!(key, size, space_used = inner.space_used, "Stored entry");
        Ok(size)
    }

    // == Remove ==
    /// Removes the entry under `key`, returning the bytes released.
    pub fn remove(&self, key: &str) -> Result<usize> {
        let mut inner = self.inner.write();
        let slot = inner
            .entries
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        inner.space_used -= slot.size;
        Ok(slot.size)
    }

    // == Remove Entry At ==
    /// Removes one record from a record list read out of the entry `key`.
    ///
    /// The record's estimated size is released from both the global counter
    /// and the entry's own accounted size, so writing the shortened document
    /// back under `key` settles the exact difference. Returns the bytes
    /// released; an empty list or out-of-range index releases nothing.
    ///
    /// # Errors
    /// * `Ownership` if the record was not created by the bound owner.
    ///   Nothing is changed in that case.
    /// * `NotFound` if `key` holds no entry.
    pub fn remove_entry_at(
        &self,
        key: &str,
        index: usize,
        records: &mut Vec<Record>,
    ) -> Result<usize> {
        let Some(record) = records.get(index) else {
            return Ok(0);
        };
        let size = estimate_size(record)?;

        let mut inner = self.inner.write();
        let owner = inner.owner.ok_or(StoreError::NotBound)?;
        if !record.is_owned_by(owner) {
            return Err(StoreError::Ownership {
                expected: owner,
                found: record.parent_id,
            });
        }

        let slot = inner
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let released = size.min(slot.size);
        slot.size -= released;
        inner.space_used -= released;

        records.remove(index);
        Ok(released)
    }

    // == Find Map ==
    /// Visits entries in key order, returning the first `Some` produced by `f`.
    ///
    /// Entries that do not deserialize as `T` are skipped.
    pub fn find_map<T, R, F>(&self, mut f: F) -> Option<R>
    where
        T: DeserializeOwned,
        F: FnMut(&str, T) -> Option<R>,
    {
        let inner = self.inner.read();
        inner.entries.iter().find_map(|(key, slot)| {
            match serde_json::from_str::<T>(&slot.serialized) {
                Ok(value) => f(key.as_str(), value),
                Err(err) => {
                    debug!(key = key.as_str(), error = %err, "Skipping entry of a different shape");
                    None
                }
            }
        })
    }

    // == Key Lock ==
    /// Returns the lock that serializes read-modify-write cycles on `key`.
    pub fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of keys with a lock table entry.
    pub fn tracked_locks(&self) -> usize {
        self.key_locks.len()
    }

    // == Accessors ==
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Accounted size of the entry under `key`.
    pub fn entry_size(&self, key: &str) -> Option<usize> {
        self.inner.read().entries.get(key).map(|slot| slot.size)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn space_used(&self) -> usize {
        self.inner.read().space_used
    }

    /// The byte ceiling.
    pub fn budget(&self) -> usize {
        self.inner.read().budget
    }

    pub fn remaining_space(&self) -> usize {
        let inner = self.inner.read();
        inner.budget - inner.space_used
    }

    /// Remaining space in MiB.
    pub fn remaining_mib(&self) -> f64 {
        self.remaining_space() as f64 / MIB
    }

    // == Stats ==
    /// Returns a snapshot of counters and space accounting.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.lock().clone();
        let inner = self.inner.read();
        stats.total_entries = inner.entries.len();
        stats.space_used = inner.space_used;
        stats.budget = inner.budget;
        stats
    }

    /// Applies `f` to the live counters.
    pub fn update_stats(&self, f: impl FnOnce(&mut StoreStats)) {
        f(&mut self.stats.lock());
    }
}
