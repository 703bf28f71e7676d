//! Stash demo binary
//!
//! Opens a stash over the backend named by `STASH_BACKEND`, stores and reads
//! back a few values, then keeps the stash (and its eviction task) alive
//! until interrupted.

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stash::cache::Example;
use stash::{
    Backend, MemoryBackend, MemoryConfig, RedisBackend, RedisConfig, Stash, StashConfig,
    TracingLogger,
};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "stash=debug";

/// Main entry point for the stash demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the stash over the selected backend
/// 4. Write and read back sample values
/// 5. Wait for SIGINT/SIGTERM, then shut down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stash diagnostics are emitted at debug level. Override with RUST_LOG.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stash demo");

    let config = StashConfig::from_env();
    info!(
        "Configuration loaded: policy={:?}, ttl={:?}, max_size={:?}, eviction_interval={:?}",
        config.eviction_policy, config.time_to_live, config.max_size, config.eviction_interval
    );

    let backend = std::env::var("STASH_BACKEND").unwrap_or_else(|_| "memory".to_string());
    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => run::<MemoryBackend>(config, MemoryConfig::default()).await,
        "redis" => run::<RedisBackend>(config, RedisConfig::from_env()).await,
        other => bail!("unknown backend {:?}, expected memory or redis", other),
    }
}

async fn run<B: Backend>(config: StashConfig, backend: B::Config) -> anyhow::Result<()> {
    let stash = Stash::<B>::with_logger(Arc::new(TracingLogger::new()));
    stash.configure(config, backend).await?;
    stash
        .initialize()
        .await
        .context("failed to initialize stash")?;
    info!("Stash initialized");

    let samples = [
        ("answer", Example { int: 42, ..Example::default() }),
        ("pi", Example { float: 2.5, ..Example::default() }),
        ("greeting", Example::with_string("hello")),
    ];
    for (key, value) in &samples {
        stash.write(*key, value).await?;
    }
    for (key, _) in &samples {
        let mut out = Example::default();
        stash.read(*key, &mut out).await?;
        info!("Read {}: {:?}", key, out);
    }

    let stats = stash.stats();
    info!(
        "Stats: writes={}, hits={}, misses={}, evictions={}, size={} bytes",
        stats.writes, stats.hits, stats.misses, stats.evictions, stats.aggregate_size
    );

    shutdown_signal().await;

    stash.shutdown().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
