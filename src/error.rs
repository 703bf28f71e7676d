//! Error types for the stash
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the stash and its backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `initialize` was called before `configure`
    #[error("not configured")]
    NotConfigured,

    /// `initialize` called twice, or `configure` called while initialized
    #[error("already initialized")]
    AlreadyInitialized,

    /// A data-path call was made outside the initialized state
    #[error("not initialized")]
    NotInitialized,

    /// No entry exists for the key
    #[error("value for {0} not found")]
    NotFound(String),

    /// A cached value or stored record could not be encoded or decoded
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// The remote backend call failed or timed out
    #[error("transport failure: {0}")]
    Transport(String),

    /// The key cannot be represented as a backend field name
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
}

impl CacheError {
    /// Returns true for [`CacheError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the stash.
pub type Result<T> = std::result::Result<T, CacheError>;
