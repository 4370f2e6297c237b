//! Named key persistence so fixture accounts survive between runs.

use crate::{Account, Error};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// Plaintext JSON key store. Dev and test networks only.
pub struct KeyStore {
    path: Option<PathBuf>,
    keys: Mutex<BTreeMap<String, String>>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredKeys {
    keys: Vec<StoredKey>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredKey {
    name: String,
    secret_key: String,
}

impl KeyStore {
    /// Keys live only as long as the store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            keys: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load keys from `path` if it exists; new keys are written back to it.
    pub fn new_plaintext(path: PathBuf) -> Result<Self, Error> {
        let keys = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| Error::KeyStore(format!("read {}: {e}", path.display())))?;
            let stored: StoredKeys = serde_json::from_str(&json)
                .map_err(|e| Error::KeyStore(format!("parse {}: {e}", path.display())))?;
            info!(path = %path.display(), count = stored.keys.len(), "Loaded key store");
            stored
                .keys
                .into_iter()
                .map(|k| (k.name, k.secret_key))
                .collect()
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            keys: Mutex::new(keys),
        })
    }

    /// Return the account stored under `name`, generating it if absent.
    /// The flag is `true` when the account was just created.
    pub fn get_or_create(&self, name: &str) -> Result<(Account, bool), Error> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| Error::KeyStore("key store lock poisoned".into()))?;
        if let Some(secret) = keys.get(name) {
            return Ok((Account::from_base64(secret)?, false));
        }
        let account = Account::generate();
        let mut updated = keys.clone();
        updated.insert(name.to_string(), account.secret_base64());
        self.save(&updated)?;
        *keys = updated;
        Ok((account, true))
    }

    pub fn names(&self) -> Result<Vec<String>, Error> {
        let keys = self
            .keys
            .lock()
            .map_err(|_| Error::KeyStore("key store lock poisoned".into()))?;
        Ok(keys.keys().cloned().collect())
    }

    fn save(&self, keys: &BTreeMap<String, String>) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stored = StoredKeys {
            keys: keys
                .iter()
                .map(|(name, secret_key)| StoredKey {
                    name: name.clone(),
                    secret_key: secret_key.clone(),
                })
                .collect(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::KeyStore(format!("create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(path, json)
            .map_err(|e| Error::KeyStore(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}
