//! Ledger state and minimum-balance accounting.

use crate::transaction::StateSchema;
use game_types::Address;
use std::collections::{BTreeMap, HashMap};

/// Base minimum balance of any account holding funds.
pub const MIN_BALANCE: u64 = 100_000;
/// Extra minimum balance per created application.
pub const APP_PAGE_MIN_BALANCE: u64 = 100_000;
pub const SCHEMA_UINT_MIN_BALANCE: u64 = 28_500;
pub const SCHEMA_BYTES_MIN_BALANCE: u64 = 50_000;
pub const BOX_FLAT_MIN_BALANCE: u64 = 2_500;
pub const BOX_BYTE_MIN_BALANCE: u64 = 400;
pub const MAX_BOX_SIZE: usize = 32_768;
pub const MAX_BOX_NAME_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct AppRecord {
    pub creator: Address,
    /// Note of the creating transaction.
    pub note: Vec<u8>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    pub boxes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl AppRecord {
    fn box_min_balance(&self) -> u64 {
        self.boxes
            .iter()
            .map(|(name, value)| {
                BOX_FLAT_MIN_BALANCE + BOX_BYTE_MIN_BALANCE * (name.len() + value.len()) as u64
            })
            .sum()
    }

    fn creator_min_balance(&self) -> u64 {
        let schema = |s: &StateSchema| {
            s.num_uints * SCHEMA_UINT_MIN_BALANCE + s.num_byte_slices * SCHEMA_BYTES_MIN_BALANCE
        };
        APP_PAGE_MIN_BALANCE + schema(&self.global_schema) + schema(&self.local_schema)
    }
}

#[derive(Debug, Clone)]
pub struct LedgerState {
    pub round: u64,
    /// Timestamp (seconds) of the latest committed block.
    pub timestamp: u64,
    pub balances: HashMap<Address, u64>,
    pub apps: BTreeMap<u64, AppRecord>,
    pub next_app_id: u64,
    /// Committed transaction ids mapped to their last valid round.
    pub seen_txids: HashMap<String, u64>,
}

impl LedgerState {
    pub fn genesis(dispenser: Address, supply: u64, timestamp: u64) -> Self {
        Self {
            round: 1,
            timestamp,
            balances: HashMap::from([(dispenser, supply)]),
            apps: BTreeMap::new(),
            next_app_id: 1001,
            seen_txids: HashMap::new(),
        }
    }

    /// Forget ids that can no longer be replayed: their validity window has
    /// closed, so the round check rejects them first.
    pub fn prune_expired_txids(&mut self) {
        let round = self.round;
        self.seen_txids.retain(|_, last_valid| *last_valid >= round);
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Application whose escrow account is `address`, if any.
    fn app_for_address(&self, address: &Address) -> Option<&AppRecord> {
        self.apps
            .iter()
            .find(|(id, _)| Address::for_application(**id) == *address)
            .map(|(_, app)| app)
    }

    pub fn min_balance(&self, address: &Address) -> u64 {
        let created: u64 = self
            .apps
            .values()
            .filter(|app| app.creator == *address)
            .map(AppRecord::creator_min_balance)
            .sum();
        let boxes = self
            .app_for_address(address)
            .map_or(0, AppRecord::box_min_balance);
        MIN_BALANCE + created + boxes
    }

    /// Accounts with nothing in them and nothing to pay for are exempt.
    pub fn check_min_balance(&self, address: &Address) -> Result<(), String> {
        let balance = self.balance(address);
        let required = self.min_balance(address);
        if balance == 0 && required == MIN_BALANCE {
            return Ok(());
        }
        if balance < required {
            return Err(format!(
                "account {address} balance {balance} below min {required}"
            ));
        }
        Ok(())
    }

    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<(), String> {
        let balance = self.balance(address);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            format!("overspend: account {address} balance {balance} cannot cover {amount}")
        })?;
        self.balances.insert(*address, remaining);
        Ok(())
    }

    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<(), String> {
        let balance = self.balance(address);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| format!("balance overflow for {address}"))?;
        self.balances.insert(*address, updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_min_balance_grows_with_boxes() {
        let creator = Address::new([1; 32]);
        let mut state = LedgerState::genesis(creator, 10_000_000, 1);
        state.apps.insert(
            1001,
            AppRecord {
                creator,
                note: vec![],
                approval_program: vec![],
                clear_program: vec![],
                global_schema: StateSchema::default(),
                local_schema: StateSchema::default(),
                boxes: BTreeMap::new(),
            },
        );
        let app_address = Address::for_application(1001);
        assert_eq!(state.min_balance(&app_address), MIN_BALANCE);
        assert!(state.check_min_balance(&app_address).is_ok());

        state
            .apps
            .get_mut(&1001)
            .unwrap()
            .boxes
            .insert(b"user".to_vec(), vec![0; 10]);
        assert_eq!(state.min_balance(&app_address), MIN_BALANCE + 2_500 + 400 * 14);
        assert!(state.check_min_balance(&app_address).is_err());

        assert_eq!(state.min_balance(&creator), MIN_BALANCE + APP_PAGE_MIN_BALANCE);
    }

    #[test]
    fn test_prune_expired_txids() {
        let mut state = LedgerState::genesis(Address::new([1; 32]), 1, 1);
        state.seen_txids.insert("old".into(), 10);
        state.seen_txids.insert("live".into(), 20);
        state.round = 10;
        state.prune_expired_txids();
        assert_eq!(state.seen_txids.len(), 2);

        state.round = 11;
        state.prune_expired_txids();
        assert!(!state.seen_txids.contains_key("old"));
        assert!(state.seen_txids.contains_key("live"));
    }

    #[test]
    fn test_debit_overspend() {
        let a = Address::new([1; 32]);
        let mut state = LedgerState::genesis(a, 50, 1);
        assert!(state.debit(&a, 51).is_err());
        state.debit(&a, 50).unwrap();
        assert_eq!(state.balance(&a), 0);
        assert!(state.check_min_balance(&a).is_ok());
    }
}
