//! Cacheable Values
//!
//! The capability every value stored in a stash must provide: turning itself
//! into bytes and loading itself back from them. The stash never looks inside
//! the bytes; the format is the value's own choice.

use std::error::Error;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Error produced by a value's own codec.
pub type CodecError = Box<dyn Error + Send + Sync>;

// == Cacheable ==
/// A value that can be written to and read from a stash.
///
/// `decode` works like an unmarshal: it overwrites `self` with the contents
/// of `bytes`.
pub trait Cacheable {
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    fn decode(&mut self, bytes: &[u8]) -> Result<(), CodecError>;
}

impl Cacheable for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.clone())
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl Cacheable for String {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        *self = String::from_utf8(bytes.to_vec())?;
        Ok(())
    }
}

// == Json Adapter ==
/// Makes any serde type cacheable by storing its JSON encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> Cacheable for Json<T> {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.0 = serde_json::from_slice(bytes)?;
        Ok(())
    }
}

// == Example ==
/// Small cacheable record used by the demo binary and the test suites.
///
/// Zero/empty fields are left out of the encoding, so a value holding only a
/// 36 character string encodes to 49 bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub int: i64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub float: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub string: String,
}

impl Example {
    pub fn with_string(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            ..Self::default()
        }
    }
}

impl Cacheable for Example {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        *self = serde_json::from_slice(bytes)?;
        Ok(())
    }
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}
