//! Digest helpers.

use sha2::{Digest, Sha256, Sha512_256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-512/256, the digest behind addresses, transaction ids and method selectors.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    Sha512_256::digest(data).into()
}
