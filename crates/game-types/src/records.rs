//! Typed views over the contract's box values.

use crate::{AbiError, AbiType, AbiValue};
use serde::{Deserialize, Serialize};

/// A record stored as a single ABI value.
pub trait AbiRecord: Sized {
    /// Canonical ABI type string of the stored value.
    const ABI: &'static str;

    fn to_abi(&self) -> AbiValue;
    fn from_abi(value: AbiValue) -> Result<Self, AbiError>;

    fn abi_type() -> Result<AbiType, AbiError> {
        AbiType::parse(Self::ABI)
    }

    fn encode(&self) -> Result<Vec<u8>, AbiError> {
        Self::abi_type()?.encode(&self.to_abi())
    }

    fn decode(bytes: &[u8]) -> Result<Self, AbiError> {
        Self::from_abi(Self::abi_type()?.decode(bytes)?)
    }
}

/// Player profile, kept in the `user` box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub registered_at: u64,
    pub name: String,
    pub balance: u64,
}

/// Purchasable item, kept in the `asset` box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub description: String,
    pub price: u64,
}

impl Asset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

fn three_fields(value: AbiValue, what: &str) -> Result<[AbiValue; 3], AbiError> {
    value
        .into_tuple()
        .and_then(|fields| <[AbiValue; 3]>::try_from(fields).ok())
        .ok_or_else(|| AbiError::Decode(format!("{what} is not a 3-tuple")))
}

fn field_u64(value: &AbiValue, field: &str) -> Result<u64, AbiError> {
    value
        .as_u64()
        .ok_or_else(|| AbiError::Decode(format!("{field} is not a uint64")))
}

fn field_string(value: AbiValue, field: &str) -> Result<String, AbiError> {
    match value {
        AbiValue::String(s) => Ok(s),
        _ => Err(AbiError::Decode(format!("{field} is not a string"))),
    }
}

impl AbiRecord for User {
    const ABI: &'static str = "(uint64,string,uint64)";

    fn to_abi(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::Uint(self.registered_at),
            AbiValue::String(self.name.clone()),
            AbiValue::Uint(self.balance),
        ])
    }

    fn from_abi(value: AbiValue) -> Result<Self, AbiError> {
        let [registered_at, name, balance] = three_fields(value, "user")?;
        Ok(Self {
            registered_at: field_u64(&registered_at, "registered_at")?,
            name: field_string(name, "name")?,
            balance: field_u64(&balance, "balance")?,
        })
    }
}

impl AbiRecord for Asset {
    const ABI: &'static str = "(string,string,uint64)";

    fn to_abi(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::String(self.name.clone()),
            AbiValue::String(self.description.clone()),
            AbiValue::Uint(self.price),
        ])
    }

    fn from_abi(value: AbiValue) -> Result<Self, AbiError> {
        let [name, description, price] = three_fields(value, "asset")?;
        Ok(Self {
            name: field_string(name, "name")?,
            description: field_string(description, "description")?,
            price: field_u64(&price, "price")?,
        })
    }
}

/// Per-user asset quantities are stored as a bare `uint64`.
pub fn encode_quantity(quantity: u64) -> Vec<u8> {
    quantity.to_be_bytes().to_vec()
}

pub fn decode_quantity(bytes: &[u8]) -> Result<u64, AbiError> {
    AbiType::Uint(64)
        .decode(bytes)
        .and_then(|v| field_u64(&v, "quantity"))
}
