//! Storage Backends
//!
//! The minimal contract a storage substrate must satisfy to hold stash
//! entries, plus the two substrates shipped with the crate.
//!
//! # Backends
//! - [`MemoryBackend`]: in-process table, cheap to scan, evicted inline
//! - [`RedisBackend`]: one Redis hash, scanned by a periodic task

pub mod memory;
pub mod redis;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::cache::{CacheEntry, Key};
use crate::error::Result;

pub use self::memory::{MemoryBackend, MemoryConfig};
pub use self::redis::{RedisBackend, RedisConfig};

// == Backend ==
/// Storage capability behind a [`Stash`](crate::cache::Stash).
///
/// Each call is atomic for its key. `list_all` is a snapshot and may be
/// weakly consistent with concurrent writers.
#[async_trait]
pub trait Backend: Send + Sync + Sized + 'static {
    /// Connection or allocation parameters.
    type Config: Clone + Debug + Send + Sync + 'static;

    /// True when a full scan is cheap enough to evict after every call.
    /// Otherwise eviction only runs from the periodic task.
    const INLINE_EVICTION: bool;

    /// Opens the backend.
    async fn connect(config: &Self::Config) -> Result<Self>;

    /// Fetches the entry for `key`, [`CacheError::NotFound`](crate::error::CacheError::NotFound)
    /// when absent.
    async fn get(&self, key: &Key) -> Result<CacheEntry>;

    /// Stores `entry` under `key`, overwriting unconditionally.
    async fn set(&self, key: &Key, entry: &CacheEntry) -> Result<()>;

    /// Removes `key`, [`CacheError::NotFound`](crate::error::CacheError::NotFound)
    /// when absent.
    async fn delete(&self, key: &Key) -> Result<()>;

    /// Snapshot of every entry.
    async fn list_all(&self) -> Result<Vec<CacheEntry>>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;

    /// Releases resources held by the backend.
    async fn close(&self) -> Result<()>;
}
