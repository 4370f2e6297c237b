//! Box-name derivation. These byte layouts are part of the contract's storage
//! format and must stay byte-exact.

use crate::{sha256, AbiError, AbiType, AbiValue, Address};

pub const USER_PREFIX: &[u8] = b"user";
pub const ASSET_PREFIX: &[u8] = b"asset";
pub const USER_ASSET_PREFIX: &[u8] = b"user_asset";

/// Asset identifier: `sha256` of the ABI-encoded asset name.
pub type AssetId = [u8; 32];

/// `"user" || address`
pub fn user_box_name(address: &Address) -> Vec<u8> {
    [USER_PREFIX, address.as_bytes()].concat()
}

pub fn asset_id(name: &str) -> Result<AssetId, AbiError> {
    let encoded = AbiType::String.encode(&AbiValue::String(name.to_string()))?;
    Ok(sha256(&encoded))
}

/// `"asset" || asset_id`
pub fn asset_box_name(asset_id: &AssetId) -> Vec<u8> {
    [ASSET_PREFIX, asset_id.as_slice()].concat()
}

/// `"user_asset" || sha256(address || asset_id)`
pub fn user_asset_box_name(address: &Address, asset_id: &AssetId) -> Vec<u8> {
    let key = sha256(&[address.as_bytes().as_slice(), asset_id.as_slice()].concat());
    [USER_ASSET_PREFIX, key.as_slice()].concat()
}
