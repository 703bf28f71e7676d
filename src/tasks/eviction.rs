//! Eviction Task
//!
//! Background task that periodically runs eviction passes against backends
//! whose full scan is too expensive to run after every call.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::cache::Evictor;

// == Eviction Task ==
/// Handle to a running eviction task.
///
/// Dropping the handle cancels the task without waiting for it.
#[derive(Debug)]
pub struct EvictionTask {
    handle: JoinHandle<()>,
    stop: DropGuard,
}

impl EvictionTask {
    // == Stop ==
    /// Signals the task to stop and waits until it has exited.
    ///
    /// A pass already in progress runs to completion first.
    pub async fn stop(self) {
        drop(self.stop);
        if let Err(err) = self.handle.await {
            warn!("Eviction task ended abnormally: {}", err);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a task that runs an eviction pass immediately and then once per
/// `interval` until stopped.
///
/// # Arguments
/// * `evictor` - Pass to run, shared with the owning stash
/// * `interval` - Time between passes, must be non-zero
pub fn spawn_eviction_task<B: Backend>(evictor: Arc<Evictor<B>>, interval: Duration) -> EvictionTask {
    let stop = CancellationToken::new();
    let stopped = stop.clone();

    let handle = tokio::spawn(async move {
        debug!("Starting eviction task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stopped.cancelled() => break,
                // The first tick completes immediately.
                _ = ticker.tick() => {
                    let removed = evictor.run_logged().await;
                    if removed > 0 {
                        debug!("Eviction pass: removed {} entries", removed);
                    }
                }
            }
        }

        debug!("Eviction task stopped");
    });

    EvictionTask {
        handle,
        stop: stop.drop_guard(),
    }
}
