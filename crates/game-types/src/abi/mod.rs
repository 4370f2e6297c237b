//! ARC-4 ABI: type grammar, value codec and method descriptors.
//!
//! Values are encoded the way application calls pass arguments and the way the
//! game contract lays out its boxes: big-endian integers, `u16` length-prefixed
//! strings and dynamic arrays, and head/tail tuples whose dynamic members are
//! referenced by `u16` offsets relative to the start of the tuple.

mod codec;
mod method;
mod types;

pub use method::{ArgType, Method, RETURN_PREFIX};
pub use types::AbiType;

use crate::Address;

/// A decoded ABI value. Static and dynamic arrays share [`AbiValue::Array`];
/// the [`AbiType`] used for encoding tells them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(u64),
    Byte(u8),
    Bool(bool),
    Address(Address),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// `byte[N]` payloads are arrays of bytes.
    pub fn bytes(raw: &[u8]) -> Self {
        Self::Array(raw.iter().copied().map(Self::Byte).collect())
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Array(items) => items
                .iter()
                .map(|v| match v {
                    Self::Byte(b) => Some(*b),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<AbiValue>> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for AbiValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for AbiValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Address> for AbiValue {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}
