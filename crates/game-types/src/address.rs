//! 32-byte account addresses and their checksummed base32 text form.

use crate::{sha512_256, AbiError};
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CHECKSUM_LEN: usize = 4;
const APP_ID_PREFIX: &[u8] = b"appID";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AbiError> {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AbiError::InvalidAddress(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(raw))
    }

    /// Escrow address controlled by an application.
    pub fn for_application(app_id: u64) -> Self {
        let mut preimage = Vec::with_capacity(APP_ID_PREFIX.len() + 8);
        preimage.extend_from_slice(APP_ID_PREFIX);
        preimage.extend_from_slice(&app_id.to_be_bytes());
        Self(sha512_256(&preimage))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = sha512_256(&self.0);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        out
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(32 + CHECKSUM_LEN);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&buf))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| AbiError::InvalidAddress(format!("{s}: {e}")))?;
        if decoded.len() != 32 + CHECKSUM_LEN {
            return Err(AbiError::InvalidAddress(format!(
                "{s}: decoded to {} bytes",
                decoded.len()
            )));
        }
        let address = Self::from_slice(&decoded[..32])?;
        if address.checksum()[..] != decoded[32..] {
            return Err(AbiError::InvalidAddress(format!("{s}: checksum mismatch")));
        }
        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
