//! Stash Statistics Module
//!
//! Tracks stash activity and the aggregate payload size.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stash Stats ==
/// Point-in-time view of a stash's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StashStats {
    /// Number of successful reads
    pub hits: u64,
    /// Number of reads that found no entry
    pub misses: u64,
    /// Number of successful writes
    pub writes: u64,
    /// Writes that replaced an existing entry
    pub replacements: u64,
    /// Number of successful explicit deletes
    pub deletes: u64,
    /// Number of entries removed by eviction
    pub evictions: u64,
    /// Eviction passes abandoned because of an error
    pub eviction_failures: u64,
    /// Running total of live payload bytes
    pub aggregate_size: u64,
}

impl StashStats {
    // == Hit Rate ==
    /// Calculates the read hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Shared, lock-free counters behind [`StashStats`].
///
/// The aggregate size is only adjusted by the stash and its eviction pass.
#[derive(Debug, Default)]
pub struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    replacements: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    eviction_failures: AtomicU64,
    aggregate_size: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, replaced: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.replacements.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction_failure(&self) {
        self.eviction_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Aggregate Size ==
    pub fn aggregate_size(&self) -> u64 {
        self.aggregate_size.load(Ordering::Acquire)
    }

    pub fn add_size(&self, bytes: u64) {
        self.aggregate_size.fetch_add(bytes, Ordering::AcqRel);
    }

    /// Subtracts `bytes`, saturating at zero.
    pub fn sub_size(&self, bytes: u64) {
        let _ = self
            .aggregate_size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    /// Replaces the tracked size with an authoritative total.
    pub fn set_size(&self, bytes: u64) {
        self.aggregate_size.store(bytes, Ordering::Release);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StashStats {
        StashStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            eviction_failures: self.eviction_failures.load(Ordering::Relaxed),
            aggregate_size: self.aggregate_size(),
        }
    }
}
