//! Cache Module
//!
//! Entry model, eviction policies and the stash engine that ties them to a
//! storage backend.

mod cacheable;
mod entry;
mod evictor;
mod key;
mod policy;
mod stash;
mod stats;


// Re-export public types
pub use cacheable::{Cacheable, CodecError, Example, Json};
pub use entry::{current_timestamp_ns, CacheEntry};
pub use evictor::Evictor;
pub use key::Key;
pub use policy::{select_evictions, Bounds, Eviction, EvictionPolicy, EvictionReason};
pub use stash::Stash;
pub use stats::{Counters, StashStats};

use crate::backend::{MemoryBackend, RedisBackend};

/// Stash over the in-process backend.
pub type MemoryStash = Stash<MemoryBackend>;

/// Stash over a Redis hash.
pub type RedisStash = Stash<RedisBackend>;
