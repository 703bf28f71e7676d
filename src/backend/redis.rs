//! Redis Backend
//!
//! Stores every entry as one field of a single Redis hash. The field name is
//! the key and the field value is the JSON encoding of the whole
//! [`CacheEntry`], metadata included. Scanning means fetching the whole
//! hash, so stashes over this backend only evict from the periodic task.

use std::env;
use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisResult};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::cache::{CacheEntry, Key};
use crate::config::parse;
use crate::error::{CacheError, Result};

const DEFAULT_ADDRESS: &str = "localhost";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_DATABASE: i64 = 0;
const DEFAULT_HASH_KEY: &str = "stash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redis connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Server host name or IP
    pub address: String,
    /// Server port
    pub port: u16,
    /// Password, if the server requires one
    pub password: Option<String>,
    /// Logical database index
    pub database: i64,
    /// Name of the hash holding every entry
    pub hash_key: String,
    /// Upper bound for each network call
    pub timeout: Duration,
}

impl RedisConfig {
    /// Creates a new RedisConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_ADDRESS` - Host (default: localhost)
    /// - `REDIS_PORT` - Port (default: 6379)
    /// - `REDIS_PASSWORD` - Password (default: none)
    /// - `REDIS_DATABASE` - Database index (default: 0)
    /// - `REDIS_HASH_KEY` - Hash name (default: stash)
    /// - `REDIS_TIMEOUT` - Per-call timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`RedisConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(address) = var("REDIS_ADDRESS") {
            config.address = address;
        }
        if let Some(port) = var("REDIS_PORT").and_then(|v| parse(&v)) {
            config.port = port;
        }
        if let Some(password) = var("REDIS_PASSWORD") {
            config.password = Some(password);
        }
        if let Some(database) = var("REDIS_DATABASE").and_then(|v| parse(&v)) {
            config.database = database;
        }
        if let Some(hash_key) = var("REDIS_HASH_KEY") {
            config.hash_key = hash_key;
        }
        if let Some(secs) = var("REDIS_TIMEOUT").and_then(|v| parse::<u64>(&v)) {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// `redis://[:password@]host:port/db`
    pub fn connection_url(&self) -> String {
        let auth = match &self.password {
            Some(password) => format!(":{}@", urlencoding::encode(password)),
            None => String::new(),
        };
        format!(
            "redis://{}{}:{}/{}",
            auth, self.address, self.port, self.database
        )
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            password: None,
            database: DEFAULT_DATABASE,
            hash_key: DEFAULT_HASH_KEY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// == Redis Backend ==
/// Hash-backed remote storage.
pub struct RedisBackend {
    conn: ConnectionManager,
    hash_key: String,
    timeout: Duration,
}

impl RedisBackend {
    /// Runs one Redis call, failing with a transport error once `timeout`
    /// elapses.
    async fn call<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        bounded(self.timeout, op, fut).await
    }

    fn decode(value: &str) -> Result<CacheEntry> {
        Ok(serde_json::from_str(value)?)
    }
}

async fn bounded<T, F>(timeout: Duration, op: &str, fut: F) -> Result<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| CacheError::Transport(format!("{}: {}", op, e))),
        Err(_) => Err(CacheError::Transport(format!(
            "{}: timed out after {:?}",
            op, timeout
        ))),
    }
}

#[async_trait]
impl Backend for RedisBackend {
    type Config = RedisConfig;

    const INLINE_EVICTION: bool = false;

    async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.connection_url())?;
        let conn = bounded(config.timeout, "connect", ConnectionManager::new(client)).await?;
        info!(
            "Connected to redis at {}:{}/{}, hash key {}",
            config.address, config.port, config.database, config.hash_key
        );

        Ok(Self {
            conn,
            hash_key: config.hash_key.clone(),
            timeout: config.timeout,
        })
    }

    async fn get(&self, key: &Key) -> Result<CacheEntry> {
        let field = key.field_name()?;
        let mut conn = self.conn.clone();
        let value: Option<String> = self.call("HGET", conn.hget(&self.hash_key, field)).await?;

        match value {
            Some(value) => Self::decode(&value),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn set(&self, key: &Key, entry: &CacheEntry) -> Result<()> {
        let field = key.field_name()?;
        let value = serde_json::to_string(entry)?;
        let mut conn = self.conn.clone();
        let _: i64 = self
            .call("HSET", conn.hset(&self.hash_key, field, value))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let field = key.field_name()?;
        let mut conn = self.conn.clone();
        let removed: i64 = self.call("HDEL", conn.hdel(&self.hash_key, field)).await?;

        if removed == 0 {
            return Err(CacheError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>> {
        let mut conn = self.conn.clone();
        let fields: Vec<(String, String)> =
            self.call("HGETALL", conn.hgetall(&self.hash_key)).await?;

        fields
            .iter()
            .map(|(_, value)| Self::decode(value))
            .collect()
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = self.call("DEL", conn.del(&self.hash_key)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The connection manager closes its socket when the last clone drops.
        debug!("Releasing redis connection for hash key {}", self.hash_key);
        Ok(())
    }
}
