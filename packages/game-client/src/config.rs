//! Client configuration.

use crate::{Account, AlgodHttp, AppSpec, Error, IndexerHttp, Ledger, LocalNet};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// In-process ledger, nothing to connect to.
    Localnet,
    /// Remote node over algod REST.
    Algod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::network")]
    pub network: NetworkKind,

    #[serde(default = "defaults::algod_url")]
    pub algod_url: String,

    #[serde(default = "defaults::api_token")]
    pub algod_token: String,

    /// Empty disables the indexer.
    #[serde(default = "defaults::indexer_url")]
    pub indexer_url: String,

    #[serde(default = "defaults::api_token")]
    pub indexer_token: String,

    #[serde(default = "defaults::keys_path")]
    pub keys_path: String,

    /// Compiled programs; both empty means the built-in game contract.
    #[serde(default)]
    pub approval_path: String,

    #[serde(default)]
    pub clear_path: String,

    /// Base64 secret of the funding account on algod networks.
    #[serde(default)]
    pub dispenser_key: String,

    /// Microalgos sent to the application account after deploy.
    #[serde(default = "defaults::app_funding")]
    pub app_funding: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: defaults::network(),
            algod_url: defaults::algod_url(),
            algod_token: defaults::api_token(),
            indexer_url: defaults::indexer_url(),
            indexer_token: defaults::api_token(),
            keys_path: defaults::keys_path(),
            approval_path: String::new(),
            clear_path: String::new(),
            dispenser_key: String::new(),
            app_funding: defaults::app_funding(),
        }
    }
}

impl Config {
    pub fn app_spec(&self) -> Result<AppSpec, Error> {
        match (self.approval_path.is_empty(), self.clear_path.is_empty()) {
            (true, true) => Ok(AppSpec::game()),
            (false, false) => {
                AppSpec::from_files(Path::new(&self.approval_path), Path::new(&self.clear_path))
            }
            _ => Err(Error::Config(
                "approval_path and clear_path must be set together".into(),
            )),
        }
    }

    pub fn indexer(&self) -> Result<Option<IndexerHttp>, Error> {
        if self.indexer_url.is_empty() || self.network == NetworkKind::Localnet {
            return Ok(None);
        }
        IndexerHttp::new(&self.indexer_url, &self.indexer_token).map(Some)
    }
}

/// Open the ledger the configuration points at.
pub fn connect(config: &Config) -> Result<Arc<dyn Ledger>, Error> {
    match config.network {
        NetworkKind::Localnet => Ok(Arc::new(LocalNet::new())),
        NetworkKind::Algod => {
            let mut algod = AlgodHttp::new(&config.algod_url, &config.algod_token)?;
            if !config.dispenser_key.is_empty() {
                algod = algod.with_dispenser(Account::from_base64(&config.dispenser_key)?);
            }
            Ok(Arc::new(algod))
        }
    }
}

mod defaults {
    use super::NetworkKind;

    pub fn network() -> NetworkKind {
        NetworkKind::Localnet
    }

    pub fn algod_url() -> String {
        "http://localhost:4001".into()
    }

    pub fn indexer_url() -> String {
        "http://localhost:8980".into()
    }

    /// Token of the standard sandbox images.
    pub fn api_token() -> String {
        "a".repeat(64)
    }

    pub fn keys_path() -> String {
        "./account_keys/game.json".into()
    }

    pub fn app_funding() -> u64 {
        100 * crate::MICROALGOS_PER_ALGO
    }
}
