//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a stash is
//! initialized.
//!
//! # Tasks
//! - Eviction: runs eviction passes for backends that are expensive to scan

mod eviction;

pub use eviction::{spawn_eviction_task, EvictionTask};
