//! Atomic group execution against a scratch copy of the ledger state.

use super::runtime::{Budget, LocalRuntime};
use super::state::{AppRecord, LedgerState};
use crate::ledger::TxnResult;
use crate::transaction::{
    compute_group_id, AppCall, OnComplete, SignedTransaction, Transaction, TxnKind,
    MAX_GROUP_SIZE,
};
use crate::Error;
use game_contract::constants::{APPROVAL_FAMILY, CLEAR_PROGRAM};
use game_contract::GameContract;
use game_types::Address;
use std::collections::{BTreeMap, HashSet};

/// Opcode budget each application call adds to the group pool.
pub const APP_CALL_BUDGET: u64 = 700;
pub const MIN_FEE: u64 = 1_000;

pub struct Executed {
    pub txns: Vec<TxnResult>,
    pub budget: Budget,
}

/// Validate and apply `group` to `state`. On error `state` is left partially
/// modified; callers execute against a clone and only keep it on success.
pub fn execute_group(
    state: &mut LedgerState,
    group: &[SignedTransaction],
    genesis_hash: &[u8; 32],
) -> Result<Executed, Error> {
    validate_group(state, group, genesis_hash)?;

    let box_refs = collect_box_refs(group)?;
    let app_calls = group.iter().filter(|s| s.txn.as_app_call().is_some()).count() as u64;
    let mut budget = Budget {
        pool: APP_CALL_BUDGET * app_calls,
        consumed: 0,
    };

    let mut txns = Vec::with_capacity(group.len());
    for (index, stxn) in group.iter().enumerate() {
        let tx_id = stxn.id()?;
        let mut result = apply(state, group, index, &box_refs, &mut budget)
            .map_err(|msg| Error::rejected(format!("transaction {tx_id}: {msg}")))?;
        state.seen_txids.insert(tx_id.clone(), stxn.txn.last_valid);
        result.tx_id = tx_id;
        txns.push(result);
    }
    Ok(Executed { txns, budget })
}

fn validate_group(
    state: &LedgerState,
    group: &[SignedTransaction],
    genesis_hash: &[u8; 32],
) -> Result<(), Error> {
    if group.is_empty() {
        return Err(Error::rejected("empty transaction group"));
    }
    if group.len() > MAX_GROUP_SIZE {
        return Err(Error::rejected(format!(
            "group of {} exceeds the limit of {MAX_GROUP_SIZE}",
            group.len()
        )));
    }

    let next_round = state.round + 1;
    let mut ids = HashSet::new();
    for stxn in group {
        let txn = &stxn.txn;
        let tx_id = stxn.id()?;
        if !stxn.verify() {
            return Err(Error::rejected(format!("transaction {tx_id}: invalid signature")));
        }
        if txn.genesis_hash != *genesis_hash {
            return Err(Error::rejected(format!("transaction {tx_id}: genesis hash mismatch")));
        }
        if txn.first_valid > next_round || txn.last_valid < next_round {
            return Err(Error::rejected(format!(
                "transaction {tx_id}: txn dead: round {next_round} outside [{}--{}]",
                txn.first_valid, txn.last_valid
            )));
        }
        if txn.fee < MIN_FEE {
            return Err(Error::rejected(format!(
                "transaction {tx_id}: fee {} below min {MIN_FEE}",
                txn.fee
            )));
        }
        if state.seen_txids.contains_key(&tx_id) || !ids.insert(tx_id.clone()) {
            return Err(Error::rejected(format!(
                "transaction {tx_id}: transaction already in ledger"
            )));
        }
    }

    let bare: Vec<_> = group.iter().map(|s| s.txn.clone()).collect();
    let expected = compute_group_id(&bare)?;
    for stxn in group {
        match stxn.txn.group {
            Some(gid) if gid == expected => {}
            None if group.len() == 1 => {}
            _ => return Err(Error::rejected("incomplete group: group id mismatch")),
        }
    }
    Ok(())
}

fn collect_box_refs(group: &[SignedTransaction]) -> Result<HashSet<(u64, Vec<u8>)>, Error> {
    let mut refs = HashSet::new();
    for call in group.iter().filter_map(|s| s.txn.as_app_call()) {
        for r in &call.boxes {
            if r.app_index != 0 {
                return Err(Error::rejected("foreign application box references are not supported"));
            }
            refs.insert((call.app_id, r.name.clone()));
        }
    }
    Ok(refs)
}

fn apply(
    state: &mut LedgerState,
    group: &[SignedTransaction],
    index: usize,
    box_refs: &HashSet<(u64, Vec<u8>)>,
    budget: &mut Budget,
) -> Result<TxnResult, String> {
    let txn = &group[index].txn;
    state.debit(&txn.sender, txn.fee)?;

    let mut result = TxnResult::default();
    match &txn.kind {
        TxnKind::Payment { receiver, amount } => {
            state.debit(&txn.sender, *amount)?;
            state.credit(receiver, *amount)?;
            state.check_min_balance(receiver)?;
        }
        TxnKind::ApplicationCall(call) => {
            let app_id = if call.app_id == 0 {
                let id = create_app(state, txn, call)?;
                result.created_app_id = Some(id);
                id
            } else {
                if call.on_complete != OnComplete::NoOp {
                    return Err(format!("on-completion {:?} is not supported", call.on_complete));
                }
                call.app_id
            };
            let creator = state
                .apps
                .get(&app_id)
                .map(|app| app.creator)
                .ok_or_else(|| format!("application {app_id} does not exist"))?;

            let mut rt = LocalRuntime {
                state: &mut *state,
                app_id,
                creator,
                group,
                index,
                box_refs,
                budget: &mut *budget,
            };
            let log = GameContract::new(&mut rt)
                .dispatch(&call.args)
                .map_err(|e| format!("logic eval error: {e}"))?;
            result.logs.extend(log);
            state.check_min_balance(&Address::for_application(app_id))?;
        }
    }
    state.check_min_balance(&txn.sender)?;
    Ok(result)
}

fn create_app(state: &mut LedgerState, txn: &Transaction, call: &AppCall) -> Result<u64, String> {
    if !call.approval_program.starts_with(APPROVAL_FAMILY) || call.clear_program != CLEAR_PROGRAM {
        return Err("unsupported program: only the game contract runs on this ledger".into());
    }
    let id = state.next_app_id;
    state.next_app_id += 1;
    state.apps.insert(
        id,
        AppRecord {
            creator: txn.sender,
            note: txn.note.clone(),
            approval_program: call.approval_program.clone(),
            clear_program: call.clear_program.clone(),
            global_schema: call.global_schema,
            local_schema: call.local_schema,
            boxes: BTreeMap::new(),
        },
    );
    Ok(id)
}
