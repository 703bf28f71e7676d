//! Cache Key Module
//!
//! Defines the closed set of key shapes a stash accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Key ==
/// Identifier of a cached entry.
///
/// Every variant is hashable and comparable, so any key works with the
/// in-process backend. Remote backends store entries as named fields and
/// only accept [`Key::Str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Str(String),
    Int(i64),
    Bytes(Vec<u8>),
}

impl Key {
    // == Field Name ==
    /// Returns the key as a string field name.
    ///
    /// Fails with [`CacheError::UnsupportedKeyType`] for non-string keys.
    pub fn field_name(&self) -> Result<&str> {
        match self {
            Key::Str(s) => Ok(s),
            other => Err(CacheError::UnsupportedKeyType(format!(
                "{} key {}",
                other.kind(),
                other
            ))),
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Key::Str(_) => "string",
            Key::Int(_) => "integer",
            Key::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{}", i),
            Key::Bytes(b) => write!(f, "{:?}", b),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::Str(value.clone())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<Vec<u8>> for Key {
    fn from(value: Vec<u8>) -> Self {
        Key::Bytes(value)
    }
}

impl From<&[u8]> for Key {
    fn from(value: &[u8]) -> Self {
        Key::Bytes(value.to_vec())
    }
}
