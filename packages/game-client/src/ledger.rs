//! The network seam: everything the client needs from a node.

use crate::transaction::{SignedTransaction, StateSchema, SuggestedParams};
use crate::{Account, Error};
use async_trait::async_trait;
use game_types::Address;

/// Per-transaction execution result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxnResult {
    pub tx_id: String,
    pub logs: Vec<Vec<u8>>,
    /// Set on application-create transactions.
    pub created_app_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    pub confirmed_round: u64,
    pub txns: Vec<TxnResult>,
}

/// Dry-run result. Nothing is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulateOutcome {
    pub txns: Vec<TxnResult>,
    pub budget_consumed: u64,
    pub budget_added: u64,
}

/// Application as recorded on-chain under its creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedApp {
    pub id: u64,
    /// Deployment name recovered from the creation note, when the backend knows it.
    pub name: Option<String>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn suggested_params(&self) -> Result<SuggestedParams, Error>;

    /// Submit an atomic group and wait until it is confirmed.
    async fn send_group(&self, group: Vec<SignedTransaction>) -> Result<GroupOutcome, Error>;

    /// Execute an atomic group without committing it.
    async fn simulate_group(&self, group: Vec<SignedTransaction>)
        -> Result<SimulateOutcome, Error>;

    /// Raw box value. Missing apps or boxes yield [`Error::Algod`] with status 404.
    async fn application_box_by_name(&self, app_id: u64, name: &[u8]) -> Result<Vec<u8>, Error>;

    async fn account_balance(&self, address: &Address) -> Result<u64, Error>;

    async fn created_apps(&self, creator: &Address) -> Result<Vec<CreatedApp>, Error>;

    /// Funded account able to top up fixture accounts, if the network has one.
    fn dispenser(&self) -> Option<Account>;
}
