//! Shared types and pure-logic utilities for the game contract.
//! No network dependency; the contract, the client and the tests all build on it.

pub mod abi;
mod address;
pub mod boxes;
mod error;
mod hash;
mod records;

pub use abi::{AbiType, AbiValue, ArgType, Method, RETURN_PREFIX};
pub use address::Address;
pub use boxes::AssetId;
pub use error::AbiError;
pub use hash::{sha256, sha512_256};
pub use records::{decode_quantity, encode_quantity, AbiRecord, Asset, User};
