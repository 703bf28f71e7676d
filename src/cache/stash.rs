//! Stash Module
//!
//! The cache engine: write, read and delete against a backend, entry
//! metadata upkeep and eviction scheduling.
//!
//! # Lifecycle
//! `configure` → `initialize` → data calls → `shutdown`. A shut down stash
//! keeps its configuration and can be initialized again. Dropping an
//! initialized stash cancels its eviction task but does not close the
//! backend.
//!
//! # Locking
//! One lock per stash. Lifecycle calls and `clear` take it exclusively.
//! Data calls take it exclusively when the backend evicts inline, so that
//! read-modify-evict is one critical section, and shared otherwise, leaving
//! per-key atomicity to the backend. Two concurrent writers of the same key
//! on a shared-lock backend may interleave their read and write-back.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::Backend;
use crate::cache::{Cacheable, CacheEntry, Counters, Evictor, Key, StashStats};
use crate::config::StashConfig;
use crate::error::{CacheError, Result};
use crate::logger::{Diagnostics, Logger};
use crate::tasks::{spawn_eviction_task, EvictionTask};

// == Stash ==
/// Cache engine over backend `B`.
pub struct Stash<B: Backend> {
    state: RwLock<State<B>>,
    counters: Arc<Counters>,
    logger: Option<Arc<dyn Logger>>,
}

struct State<B: Backend> {
    config: Option<(StashConfig, B::Config)>,
    running: Option<Running<B>>,
}

/// Resources that exist only while initialized.
struct Running<B: Backend> {
    backend: Arc<B>,
    evictor: Arc<Evictor<B>>,
    task: Option<EvictionTask>,
    diag: Diagnostics,
}

/// Lock held by a data call: exclusive or shared depending on the backend.
enum DataGuard<'a, B: Backend> {
    Exclusive(RwLockWriteGuard<'a, State<B>>),
    Shared(RwLockReadGuard<'a, State<B>>),
}

impl<B: Backend> Deref for DataGuard<'_, B> {
    type Target = State<B>;

    fn deref(&self) -> &State<B> {
        match self {
            DataGuard::Exclusive(guard) => guard,
            DataGuard::Shared(guard) => guard,
        }
    }
}

impl<B: Backend> State<B> {
    fn running(&self) -> Result<&Running<B>> {
        self.running.as_ref().ok_or(CacheError::NotInitialized)
    }
}

impl<B: Backend> Running<B> {
    /// Inline eviction after a data call, for backends that are cheap to scan.
    async fn evict_inline(&self) {
        if B::INLINE_EVICTION {
            self.evictor.run_logged().await;
        }
    }
}

impl<B: Backend> Default for Stash<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Stash<B> {
    // == Constructors ==
    /// Creates an unconfigured stash without a logger.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                config: None,
                running: None,
            }),
            counters: Arc::new(Counters::new()),
            logger: None,
        }
    }

    /// Creates an unconfigured stash that reports diagnostics to `logger`
    /// when the configuration enables debug output.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger: Some(logger),
            ..Self::new()
        }
    }

    /// Configures and initializes a new stash in one step.
    pub async fn open(config: StashConfig, backend: B::Config) -> Result<Self> {
        let stash = Self::new();
        stash.configure(config, backend).await?;
        stash.initialize().await?;
        Ok(stash)
    }

    // == Configure ==
    /// Records the configuration used by the next `initialize`.
    ///
    /// Overwrites any previous configuration. Fails with
    /// [`CacheError::AlreadyInitialized`] while initialized.
    pub async fn configure(&self, config: StashConfig, backend: B::Config) -> Result<()> {
        let mut state = self.state.write().await;
        if state.running.is_some() {
            return Err(CacheError::AlreadyInitialized);
        }
        state.config = Some((config, backend));
        Ok(())
    }

    // == Initialize ==
    /// Opens the backend and, for backends that are expensive to scan,
    /// starts the periodic eviction task.
    pub async fn initialize(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.running.is_some() {
            return Err(CacheError::AlreadyInitialized);
        }
        let (config, backend_config) = state.config.as_ref().ok_or(CacheError::NotConfigured)?;

        let backend = Arc::new(B::connect(backend_config).await?);
        let diag = Diagnostics::new(self.logger.clone(), config.debug, config.debug_prefix.clone());
        let evictor = Arc::new(Evictor::new(
            backend.clone(),
            config.bounds(),
            self.counters.clone(),
            diag.clone(),
        ));
        self.counters.set_size(0);

        let task = match (B::INLINE_EVICTION, config.active_eviction_interval()) {
            (false, Some(interval)) => Some(spawn_eviction_task(evictor.clone(), interval)),
            (false, None) => {
                diag.printf(format_args!("eviction task disabled"));
                None
            }
            (true, _) => None,
        };

        state.running = Some(Running {
            backend,
            evictor,
            task,
            diag,
        });
        Ok(())
    }

    // == Shutdown ==
    /// Stops the eviction task, waits for its current pass, then releases
    /// the backend. A no-op when not initialized.
    pub async fn shutdown(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let running = match state.running.take() {
            Some(running) => running,
            None => return Ok(()),
        };

        if let Some(task) = running.task {
            task.stop().await;
        }
        self.counters.set_size(0);
        running.backend.close().await?;
        running.diag.printf(format_args!("shut down"));
        Ok(())
    }

    // == Clear ==
    /// Removes every entry.
    pub async fn clear(&self) -> Result<()> {
        let state = self.state.write().await;
        let running = state.running()?;
        running.backend.clear().await?;
        self.counters.set_size(0);
        running.diag.printf(format_args!("cleared"));
        Ok(())
    }

    // == Write ==
    /// Stores `value` under `key`.
    ///
    /// Returns true when an existing entry was replaced.
    pub async fn write<V>(&self, key: impl Into<Key>, value: &V) -> Result<bool>
    where
        V: Cacheable + ?Sized,
    {
        let key = key.into();
        let state = self.lock_data_path().await;
        let running = state.running()?;

        let replaced = match running.backend.get(&key).await {
            Ok(mut entry) => {
                let previous = entry.size;
                entry.update(encode(value)?);
                running.backend.set(&key, &entry).await?;
                self.counters.sub_size(previous);
                self.counters.add_size(entry.size);
                running.diag.printf(format_args!("updated key: {}", key));
                true
            }
            Err(CacheError::NotFound(_)) => {
                let entry = CacheEntry::new(key.clone(), encode(value)?);
                running.backend.set(&key, &entry).await?;
                self.counters.add_size(entry.size);
                running.diag.printf(format_args!("created key: {}", key));
                false
            }
            Err(err) => return Err(err),
        };
        self.counters.record_write(replaced);

        running.evict_inline().await;
        Ok(replaced)
    }

    // == Read ==
    /// Loads the value stored under `key` into `value`.
    ///
    /// Fails with [`CacheError::NotFound`] when there is no entry.
    pub async fn read<V>(&self, key: impl Into<Key>, value: &mut V) -> Result<()>
    where
        V: Cacheable + ?Sized,
    {
        let key = key.into();
        let state = self.lock_data_path().await;
        let running = state.running()?;

        let mut entry = match running.backend.get(&key).await {
            Ok(entry) => entry,
            Err(err) => {
                if err.is_not_found() {
                    self.counters.record_miss();
                }
                return Err(err);
            }
        };
        entry.mark_read();
        value
            .decode(&entry.payload)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        running.backend.set(&key, &entry).await?;
        self.counters.record_hit();
        running.diag.printf(format_args!("read key: {}", key));

        running.evict_inline().await;
        Ok(())
    }

    // == Delete ==
    /// Removes the entry stored under `key`.
    ///
    /// Fails with [`CacheError::NotFound`] when there is no entry.
    pub async fn delete(&self, key: impl Into<Key>) -> Result<()> {
        let key = key.into();
        let state = self.lock_data_path().await;
        let running = state.running()?;

        let entry = running.backend.get(&key).await?;
        running.backend.delete(&key).await?;
        self.counters.sub_size(entry.size);
        self.counters.record_delete();
        running.diag.printf(format_args!("deleted key: {}", key));

        running.evict_inline().await;
        Ok(())
    }

    // == Stats ==
    /// Returns current counters and the tracked aggregate size.
    pub fn stats(&self) -> StashStats {
        self.counters.snapshot()
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.running.is_some()
    }

    async fn lock_data_path(&self) -> DataGuard<'_, B> {
        if B::INLINE_EVICTION {
            DataGuard::Exclusive(self.state.write().await)
        } else {
            DataGuard::Shared(self.state.read().await)
        }
    }
}

fn encode<V: Cacheable + ?Sized>(value: &V) -> Result<Vec<u8>> {
    value
        .encode()
        .map_err(|e| CacheError::Serialization(e.to_string()))
}
