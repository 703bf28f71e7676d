//! Eviction Pass
//!
//! Runs one eviction pass against a backend: snapshot, select, delete.
//! Passes are housekeeping. Their failures are logged and counted, never
//! returned to the call that triggered them.

use std::sync::Arc;

use crate::backend::Backend;
use crate::cache::policy::{select_evictions, Bounds};
use crate::cache::{current_timestamp_ns, Counters};
use crate::error::{CacheError, Result};
use crate::logger::Diagnostics;

// == Evictor ==
/// Everything an eviction pass needs, shareable with the periodic task.
pub struct Evictor<B: Backend> {
    backend: Arc<B>,
    bounds: Bounds,
    counters: Arc<Counters>,
    diag: Diagnostics,
}

impl<B: Backend> Evictor<B> {
    pub fn new(backend: Arc<B>, bounds: Bounds, counters: Arc<Counters>, diag: Diagnostics) -> Self {
        Self {
            backend,
            bounds,
            counters,
            diag,
        }
    }

    // == Run ==
    /// Runs one pass and returns how many entries it removed.
    ///
    /// Stops at the first backend error. Entries removed before the error
    /// stay removed.
    pub async fn run(&self) -> Result<usize> {
        if !self.bounds.is_bounded() {
            return Ok(0);
        }

        let entries = self.backend.list_all().await?;
        self.counters
            .set_size(entries.iter().map(|entry| entry.size).sum());

        if let Some(policy) = self.bounds.policy {
            self.diag.printf(format_args!("eviction policy: {}", policy));
        }
        if let Some(max) = self.bounds.max_size.filter(|max| *max > 0) {
            self.diag.printf(format_args!(
                "size: {}/{}",
                self.counters.aggregate_size(),
                max
            ));
        }

        let evictions = select_evictions(entries, &self.bounds, current_timestamp_ns());
        let mut removed = 0;

        for eviction in evictions {
            match self.backend.delete(&eviction.key).await {
                Ok(()) => {}
                // Already gone, a concurrent delete got there first.
                Err(CacheError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }

            self.counters.sub_size(eviction.size);
            self.counters.record_eviction();
            removed += 1;
            self.diag.printf(format_args!(
                "evicted key: {}, {}",
                eviction.key, eviction.reason
            ));
        }

        Ok(removed)
    }

    // == Run Logged ==
    /// Runs one pass, logging instead of returning a failure.
    pub async fn run_logged(&self) -> usize {
        match self.run().await {
            Ok(removed) => removed,
            Err(err) => {
                self.counters.record_eviction_failure();
                self.diag.printf(format_args!("error while evicting: {}", err));
                0
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, MemoryConfig};
    use crate::cache::{CacheEntry, EvictionPolicy, Key};
    use crate::logger::tests::MemoryLogger;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Memory storage with scripted snapshot faults.
    #[derive(Default)]
    struct FaultyScan {
        inner: MemoryBackend,
        /// Listed in every snapshot without being stored, as if a concurrent
        /// delete removed it after the snapshot was taken.
        stale: Option<CacheEntry>,
        broken: bool,
    }

    #[async_trait]
    impl Backend for FaultyScan {
        type Config = MemoryConfig;

        const INLINE_EVICTION: bool = true;

        async fn connect(config: &MemoryConfig) -> Result<Self> {
            Ok(Self {
                inner: MemoryBackend::new(config),
                ..Self::default()
            })
        }

        async fn get(&self, key: &Key) -> Result<CacheEntry> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &Key, entry: &CacheEntry) -> Result<()> {
            self.inner.set(key, entry).await
        }

        async fn delete(&self, key: &Key) -> Result<()> {
            self.inner.delete(key).await
        }

        async fn list_all(&self) -> Result<Vec<CacheEntry>> {
            if self.broken {
                return Err(CacheError::Transport("HGETALL: connection reset".to_string()));
            }
            let mut entries: Vec<CacheEntry> = self.stale.iter().cloned().collect();
            entries.extend(self.inner.list_all().await?);
            Ok(entries)
        }

        async fn clear(&self) -> Result<()> {
            self.inner.clear().await
        }

        async fn close(&self) -> Result<()> {
            self.inner.close().await
        }
    }

    async fn faulty(stale: Option<CacheEntry>, broken: bool) -> Arc<FaultyScan> {
        let backend = FaultyScan {
            stale,
            broken,
            ..FaultyScan::default()
        };
        for name in ["a", "b"] {
            let key = Key::from(name);
            backend
                .set(&key, &CacheEntry::new(key.clone(), vec![0u8; 60]))
                .await
                .unwrap();
        }
        Arc::new(backend)
    }

    async fn seeded(entries: &[(&str, usize)]) -> Arc<MemoryBackend> {
        let backend = MemoryBackend::default();
        for (name, size) in entries {
            let key = Key::from(*name);
            backend
                .set(&key, &CacheEntry::new(key.clone(), vec![0u8; *size]))
                .await
                .unwrap();
        }
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_pass_removes_selected_entries() {
        let backend = seeded(&[("a", 60), ("b", 60), ("c", 60)]).await;
        let counters = Arc::new(Counters::new());
        let logger = Arc::new(MemoryLogger::default());
        let evictor = Evictor::new(
            backend.clone(),
            Bounds {
                policy: Some(EvictionPolicy::FirstInFirstOut),
                max_size: Some(100),
                time_to_live: None,
            },
            counters.clone(),
            Diagnostics::new(Some(logger.clone()), true, ""),
        );

        assert_eq!(evictor.run().await.unwrap(), 2);

        assert_eq!(backend.len(), 1);
        assert!(backend.get(&Key::from("c")).await.is_ok());
        let stats = counters.snapshot();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.aggregate_size, 60);

        let lines = logger.lines.lock().unwrap();
        assert!(lines.contains(&"evicted key: a, max size exceeded".to_string()));
        assert!(lines.contains(&"evicted key: b, max size exceeded".to_string()));
    }

    #[tokio::test]
    async fn test_pass_reconciles_size_from_snapshot() {
        let backend = seeded(&[("a", 10), ("b", 15)]).await;
        let counters = Arc::new(Counters::new());
        counters.set_size(9_999);
        let evictor = Evictor::new(
            backend,
            Bounds {
                time_to_live: Some(Duration::from_secs(3600)),
                ..Bounds::default()
            },
            counters.clone(),
            Diagnostics::disabled(),
        );

        assert_eq!(evictor.run().await.unwrap(), 0);
        assert_eq!(counters.aggregate_size(), 25);
    }

    #[tokio::test]
    async fn test_unbounded_pass_does_not_scan() {
        let backend = seeded(&[("a", 10), ("b", 10)]).await;
        let counters = Arc::new(Counters::new());
        let evictor = Evictor::new(backend.clone(), Bounds::default(), counters, Diagnostics::disabled());

        assert_eq!(evictor.run_logged().await, 0);
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_pass_skips_entries_already_gone() {
        let stale = CacheEntry::new(Key::from("gone"), vec![0u8; 60]);
        let backend = faulty(Some(stale), false).await;
        let counters = Arc::new(Counters::new());
        let evictor = Evictor::new(
            backend.clone(),
            Bounds {
                max_size: Some(100),
                ..Bounds::default()
            },
            counters.clone(),
            Diagnostics::disabled(),
        );

        // "gone" and "a" are selected; only "a" is actually removed.
        assert_eq!(evictor.run().await.unwrap(), 1);

        assert!(backend.get(&Key::from("a")).await.is_err());
        assert!(backend.get(&Key::from("b")).await.is_ok());
        let stats = counters.snapshot();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.eviction_failures, 0);
    }

    #[tokio::test]
    async fn test_failed_pass_is_logged_and_counted() {
        let backend = faulty(None, true).await;
        let counters = Arc::new(Counters::new());
        let logger = Arc::new(MemoryLogger::default());
        let evictor = Evictor::new(
            backend.clone(),
            Bounds {
                max_size: Some(5),
                ..Bounds::default()
            },
            counters.clone(),
            Diagnostics::new(Some(logger.clone()), true, ""),
        );

        assert!(matches!(evictor.run().await, Err(CacheError::Transport(_))));
        assert_eq!(evictor.run_logged().await, 0);

        assert_eq!(counters.snapshot().eviction_failures, 1);
        assert_eq!(backend.inner.len(), 2);
        let lines = logger.lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec!["error while evicting: transport failure: HGETALL: connection reset"]
        );
    }
}
