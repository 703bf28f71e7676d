//! Cache Entry Module
//!
//! Defines the stored record for one key: the encoded payload plus the
//! lifecycle metadata eviction decisions are made from.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cache::Key;

// == Cache Entry ==
/// Represents a single cache entry with its payload and metadata.
///
/// This is also the record remote backends persist, as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the entry is stored under
    pub key: Key,
    /// Encoded value, owned by the caller's codec
    pub payload: Vec<u8>,
    /// Creation timestamp (Unix nanoseconds), never changes
    pub first_created: i64,
    /// Last write timestamp (Unix nanoseconds)
    pub last_updated: i64,
    /// Last read timestamp (Unix nanoseconds)
    pub last_read: i64,
    /// Number of successful reads
    pub read_count: u64,
    /// Payload length in bytes
    pub size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry, stamping all timestamps with the current time.
    pub fn new(key: Key, payload: Vec<u8>) -> Self {
        let now = current_timestamp_ns();
        let size = payload.len() as u64;

        Self {
            key,
            payload,
            first_created: now,
            last_updated: now,
            last_read: now,
            read_count: 0,
            size,
        }
    }

    // == Update ==
    /// Replaces the payload and stamps `last_updated`.
    ///
    /// Creation time, read time and read count are left alone.
    pub fn update(&mut self, payload: Vec<u8>) {
        self.size = payload.len() as u64;
        self.payload = payload;
        self.last_updated = current_timestamp_ns().max(self.first_created);
    }

    // == Mark Read ==
    /// Records a successful read.
    pub fn mark_read(&mut self) {
        self.read_count += 1;
        self.last_read = current_timestamp_ns().max(self.first_created);
    }

    // == Age ==
    /// Nanoseconds elapsed between the last write and `now`.
    pub fn age_since_update(&self, now: i64) -> i128 {
        i128::from(now) - i128::from(self.last_updated)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in nanoseconds.
pub fn current_timestamp_ns() -> i64 {
    // Out of range only after the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
