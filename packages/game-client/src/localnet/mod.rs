//! In-process single-node ledger that runs the game contract natively.
//!
//! `LocalNet` plays the role of a sandbox node for tests and the CLI: it checks
//! signatures, validity windows, fees and group ids, enforces box references,
//! minimum balances and the pooled opcode budget, and commits each group
//! atomically as one round.

mod exec;
mod runtime;
mod state;

pub use exec::{APP_CALL_BUDGET, MIN_FEE};
pub use state::{MAX_BOX_NAME_LEN, MAX_BOX_SIZE, MIN_BALANCE};

use crate::deploy::AppSpec;
use crate::ledger::{CreatedApp, GroupOutcome, Ledger, SimulateOutcome};
use crate::transaction::{SignedTransaction, SuggestedParams, VALIDITY_WINDOW};
use crate::{Account, Error, MICROALGOS_PER_ALGO};
use async_trait::async_trait;
use exec::execute_group;
use game_types::{sha512_256, Address};
use state::LedgerState;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const GENESIS_ID: &str = "localnet-v1";
/// Supply minted to the dispenser at genesis (10 million algos).
pub const DISPENSER_SUPPLY: u64 = 10_000_000 * MICROALGOS_PER_ALGO;

pub struct LocalNet {
    state: Mutex<LedgerState>,
    dispenser: Account,
    genesis_hash: [u8; 32],
}

impl Default for LocalNet {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalNet {
    pub fn new() -> Self {
        Self::with_dispenser(Account::generate(), DISPENSER_SUPPLY)
    }

    pub fn with_dispenser(dispenser: Account, supply: u64) -> Self {
        let state = LedgerState::genesis(dispenser.address(), supply, unix_now().max(1));
        Self {
            state: Mutex::new(state),
            dispenser,
            genesis_hash: sha512_256(GENESIS_ID.as_bytes()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, Error> {
        self.state
            .lock()
            .map_err(|_| Error::internal("localnet state lock poisoned"))
    }

    pub fn round(&self) -> Result<u64, Error> {
        Ok(self.lock()?.round)
    }

    pub fn genesis_hash(&self) -> [u8; 32] {
        self.genesis_hash
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl Ledger for LocalNet {
    async fn suggested_params(&self) -> Result<SuggestedParams, Error> {
        let round = self.lock()?.round;
        Ok(SuggestedParams {
            min_fee: MIN_FEE,
            first_valid: round,
            last_valid: round + VALIDITY_WINDOW,
            genesis_id: GENESIS_ID.to_string(),
            genesis_hash: self.genesis_hash,
        })
    }

    async fn send_group(&self, group: Vec<SignedTransaction>) -> Result<GroupOutcome, Error> {
        let mut state = self.lock()?;
        let mut scratch = state.clone();
        let executed = execute_group(&mut scratch, &group, &self.genesis_hash)?;
        scratch.round += 1;
        scratch.prune_expired_txids();
        scratch.timestamp = scratch.timestamp.max(unix_now());
        *state = scratch;
        debug!(
            round = state.round,
            txns = group.len(),
            budget_consumed = executed.budget.consumed,
            "Committed group"
        );
        Ok(GroupOutcome {
            confirmed_round: state.round,
            txns: executed.txns,
        })
    }

    async fn simulate_group(
        &self,
        group: Vec<SignedTransaction>,
    ) -> Result<SimulateOutcome, Error> {
        let mut scratch = self.lock()?.clone();
        let executed = execute_group(&mut scratch, &group, &self.genesis_hash)?;
        Ok(SimulateOutcome {
            txns: executed.txns,
            budget_consumed: executed.budget.consumed,
            budget_added: executed.budget.pool,
        })
    }

    async fn application_box_by_name(&self, app_id: u64, name: &[u8]) -> Result<Vec<u8>, Error> {
        let state = self.lock()?;
        let app = state
            .apps
            .get(&app_id)
            .ok_or_else(|| Error::not_found(format!("application {app_id} does not exist")))?;
        app.boxes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("box not found"))
    }

    async fn account_balance(&self, address: &Address) -> Result<u64, Error> {
        Ok(self.lock()?.balance(address))
    }

    async fn created_apps(&self, creator: &Address) -> Result<Vec<CreatedApp>, Error> {
        let state = self.lock()?;
        Ok(state
            .apps
            .iter()
            .filter(|(_, app)| app.creator == *creator)
            .map(|(id, app)| CreatedApp {
                id: *id,
                name: AppSpec::name_from_note(&app.note),
                approval_program: app.approval_program.clone(),
                clear_program: app.clear_program.clone(),
                global_schema: app.global_schema,
                local_schema: app.local_schema,
            })
            .collect())
    }

    fn dispenser(&self) -> Option<Account> {
        Some(self.dispenser.clone())
    }
}
