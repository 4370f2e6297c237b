//! Signing identities and the named-account fixture.

use crate::transaction::Transaction;
use crate::{Error, KeyStore, Ledger};
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use game_types::Address;
use rand::rngs::OsRng;
use std::fmt;
use tracing::info;

/// Default top-up for fixture accounts (1,000 algos).
pub const DEFAULT_ACCOUNT_FUNDING: u64 = 1_000 * crate::MICROALGOS_PER_ALGO;

/// An ed25519 key pair; the address is the raw public key.
#[derive(Clone)]
pub struct Account {
    signing_key: SigningKey,
    address: Address,
}

impl Account {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&secret))
    }

    /// Parse a base64-encoded 32-byte secret key.
    pub fn from_base64(secret_b64: &str) -> Result<Self, Error> {
        let bytes = BASE64_ENGINE.decode(secret_b64.trim())?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            Error::KeyStore(format!("secret key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_secret(secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = Address::new(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_base64(&self) -> String {
        BASE64_ENGINE.encode(self.signing_key.to_bytes())
    }

    pub(crate) fn sign_bytes(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

/// Load (or create and persist) the account stored under `name`, then make sure
/// it holds at least `fund_with` microalgos by paying the difference from the
/// ledger's dispenser. `fund_with == 0` skips funding.
pub async fn get_account(
    ledger: &dyn Ledger,
    keys: &KeyStore,
    name: &str,
    fund_with: u64,
) -> Result<Account, Error> {
    let (account, created) = keys.get_or_create(name)?;
    if created {
        info!(name, address = %account.address(), "Created account");
    }
    if fund_with == 0 {
        return Ok(account);
    }

    let balance = ledger.account_balance(&account.address()).await?;
    if balance >= fund_with {
        return Ok(account);
    }

    let dispenser = ledger
        .dispenser()
        .ok_or_else(|| Error::Config("ledger has no dispenser account configured".into()))?;
    let params = ledger.suggested_params().await?;
    let topup = fund_with - balance;
    let txn = Transaction::payment(dispenser.address(), account.address(), topup, &params);
    ledger.send_group(vec![txn.sign(&dispenser)?]).await?;
    info!(name, amount = topup, "Funded account from dispenser");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_round_trip() {
        let account = Account::generate();
        let restored = Account::from_base64(&account.secret_base64()).unwrap();
        assert_eq!(restored, account);
        assert_eq!(restored.address(), account.address());
    }

    #[test]
    fn test_bad_secret_rejected() {
        assert!(Account::from_base64("AAAA").is_err());
        assert!(Account::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let account = Account::generate();
        let dbg = format!("{account:?}");
        assert!(!dbg.contains(&account.secret_base64()));
        assert!(dbg.contains(&account.address().to_string()));
    }
}
