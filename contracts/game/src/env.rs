//! Execution environment seen by the contract.

use crate::errors::GameError;
use game_types::Address;

/// Summary of another transaction in the same group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupTxn {
    Payment {
        sender: Address,
        receiver: Address,
        amount: u64,
    },
    ApplicationCall {
        sender: Address,
        app_id: u64,
    },
}

/// Host interface implemented by the ledger executing the contract.
pub trait Runtime {
    /// Account that signed the current application call.
    fn sender(&self) -> Address;
    fn creator(&self) -> Address;
    fn current_app_address(&self) -> Address;
    /// Timestamp (seconds) of the latest committed block.
    fn latest_timestamp(&self) -> u64;
    /// Transaction `back` positions before the current one in the group.
    fn group_txn(&self, back: usize) -> Option<GroupTxn>;
    fn box_get(&mut self, name: &[u8]) -> Result<Option<Vec<u8>>, GameError>;
    fn box_put(&mut self, name: &[u8], value: &[u8]) -> Result<(), GameError>;
    /// Charge `cost` against the opcode budget.
    fn consume(&mut self, cost: u64) -> Result<(), GameError>;
}
