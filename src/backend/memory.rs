//! Memory Backend
//!
//! In-process table of entries. Scans are cheap, so stashes over this
//! backend evict inline after every call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::backend::Backend;
use crate::cache::{CacheEntry, Key};
use crate::error::{CacheError, Result};

/// Memory backend parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Number of entries to reserve room for up front
    pub initial_capacity: usize,
}

// == Memory Backend ==
/// Key to entry table guarded by a mutex.
///
/// Entries remember the order they were first inserted in; `list_all`
/// returns that order, which is the order ties are broken in.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: Mutex<Table>,
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<Key, Slot>,
    next_seq: u64,
}

#[derive(Debug)]
struct Slot {
    seq: u64,
    entry: CacheEntry,
}

impl MemoryBackend {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            table: Mutex::new(Table {
                entries: HashMap::with_capacity(config.initial_capacity),
                next_seq: 0,
            }),
        }
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A panic while holding the lock cannot leave the table half
        // written; every mutation is a single map call.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Config = MemoryConfig;

    const INLINE_EVICTION: bool = true;

    async fn connect(config: &MemoryConfig) -> Result<Self> {
        Ok(Self::new(config))
    }

    async fn get(&self, key: &Key) -> Result<CacheEntry> {
        self.lock()
            .entries
            .get(key)
            .map(|slot| slot.entry.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn set(&self, key: &Key, entry: &CacheEntry) -> Result<()> {
        let mut table = self.lock();
        if let Some(slot) = table.entries.get_mut(key) {
            slot.entry = entry.clone();
            return Ok(());
        }

        let seq = table.next_seq;
        table.next_seq += 1;
        table.entries.insert(
            key.clone(),
            Slot {
                seq,
                entry: entry.clone(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        match self.lock().entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>> {
        let table = self.lock();
        let mut slots: Vec<&Slot> = table.entries.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        let entries = slots.into_iter().map(|slot| slot.entry.clone()).collect();
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        self.lock().entries.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut table = self.lock();
        table.entries = HashMap::new();
        table.next_seq = 0;
        Ok(())
    }
}
