//! Stash - A generic cache engine over pluggable storage backends
//!
//! Values are stored with read/write metadata and evicted by FIFO, LRU or
//! LFU order once a size or age bound is exceeded. Eviction runs inline
//! for backends that are cheap to scan and from a periodic task otherwise.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod logger;
pub mod tasks;

pub use backend::{Backend, MemoryBackend, MemoryConfig, RedisBackend, RedisConfig};
pub use cache::{Cacheable, EvictionPolicy, Key, MemoryStash, RedisStash, Stash, StashStats};
pub use config::StashConfig;
pub use error::{CacheError, Result};
pub use logger::{Logger, TracingLogger};
