//! Host interface the local ledger exposes to the game contract.

use super::state::{LedgerState, MAX_BOX_NAME_LEN, MAX_BOX_SIZE};
use crate::transaction::{SignedTransaction, TxnKind};
use game_contract::{GameError, GroupTxn, Runtime};
use game_types::Address;
use std::collections::HashSet;

/// Opcode budget pooled across the application calls of a group.
#[derive(Debug, Default)]
pub struct Budget {
    pub pool: u64,
    pub consumed: u64,
}

pub struct LocalRuntime<'a> {
    pub state: &'a mut LedgerState,
    pub app_id: u64,
    pub creator: Address,
    pub group: &'a [SignedTransaction],
    pub index: usize,
    /// `(app_id, box name)` pairs referenced anywhere in the group.
    pub box_refs: &'a HashSet<(u64, Vec<u8>)>,
    pub budget: &'a mut Budget,
}

impl LocalRuntime<'_> {
    fn check_reference(&self, name: &[u8]) -> Result<(), GameError> {
        if self.box_refs.contains(&(self.app_id, name.to_vec())) {
            Ok(())
        } else {
            Err(GameError::Runtime(format!(
                "box not referenced: {}",
                hex::encode(name)
            )))
        }
    }
}

impl Runtime for LocalRuntime<'_> {
    fn sender(&self) -> Address {
        self.group[self.index].txn.sender
    }

    fn creator(&self) -> Address {
        self.creator
    }

    fn current_app_address(&self) -> Address {
        Address::for_application(self.app_id)
    }

    fn latest_timestamp(&self) -> u64 {
        self.state.timestamp
    }

    fn group_txn(&self, back: usize) -> Option<GroupTxn> {
        let position = self.index.checked_sub(back)?;
        let txn = &self.group.get(position)?.txn;
        Some(match &txn.kind {
            TxnKind::Payment { receiver, amount } => GroupTxn::Payment {
                sender: txn.sender,
                receiver: *receiver,
                amount: *amount,
            },
            TxnKind::ApplicationCall(call) => GroupTxn::ApplicationCall {
                sender: txn.sender,
                app_id: call.app_id,
            },
        })
    }

    fn box_get(&mut self, name: &[u8]) -> Result<Option<Vec<u8>>, GameError> {
        self.check_reference(name)?;
        Ok(self
            .state
            .apps
            .get(&self.app_id)
            .and_then(|app| app.boxes.get(name).cloned()))
    }

    fn box_put(&mut self, name: &[u8], value: &[u8]) -> Result<(), GameError> {
        self.check_reference(name)?;
        if name.is_empty() || name.len() > MAX_BOX_NAME_LEN {
            return Err(GameError::Runtime(format!("invalid box name length {}", name.len())));
        }
        if value.len() > MAX_BOX_SIZE {
            return Err(GameError::Runtime(format!("box size {} too large", value.len())));
        }
        let app = self
            .state
            .apps
            .get_mut(&self.app_id)
            .ok_or_else(|| GameError::Runtime(format!("application {} does not exist", self.app_id)))?;
        app.boxes.insert(name.to_vec(), value.to_vec());
        Ok(())
    }

    fn consume(&mut self, cost: u64) -> Result<(), GameError> {
        let consumed = self.budget.consumed + cost;
        if consumed > self.budget.pool {
            return Err(GameError::Runtime(format!(
                "dynamic cost budget exceeded: {consumed} > {}",
                self.budget.pool
            )));
        }
        self.budget.consumed = consumed;
        Ok(())
    }
}
