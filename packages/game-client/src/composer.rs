//! Atomic transaction composer: builds ABI method calls, groups and signs them,
//! submits or simulates the group, and decodes the ARC-4 return values.

use crate::ledger::{Ledger, TxnResult};
use crate::transaction::{
    assign_group_id, AppCall, BoxReference, SignedTransaction, Transaction, TxnKind,
    MAX_GROUP_SIZE,
};
use crate::{Account, Error};
use game_types::{AbiValue, ArgType, Method, RETURN_PREFIX};
use tracing::debug;

/// A transaction together with the account that signs it.
#[derive(Debug, Clone)]
pub struct TransactionWithSigner {
    pub txn: Transaction,
    pub signer: Account,
}

#[derive(Debug, Clone)]
pub enum MethodArg {
    Abi(AbiValue),
    /// Transaction argument; placed in the group right before the call.
    Txn(TransactionWithSigner),
}

impl From<AbiValue> for MethodArg {
    fn from(value: AbiValue) -> Self {
        MethodArg::Abi(value)
    }
}

impl From<TransactionWithSigner> for MethodArg {
    fn from(txn: TransactionWithSigner) -> Self {
        MethodArg::Txn(txn)
    }
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    pub app_id: u64,
    pub method: Method,
    pub sender: Account,
    pub args: Vec<MethodArg>,
    pub boxes: Vec<BoxReference>,
    pub note: Vec<u8>,
}

impl MethodCall {
    pub fn new(app_id: u64, method: Method, sender: Account) -> Self {
        Self {
            app_id,
            method,
            sender,
            args: Vec::new(),
            boxes: Vec::new(),
            note: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<MethodArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn boxes(mut self, boxes: Vec<BoxReference>) -> Self {
        self.boxes = boxes;
        self
    }

    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = note.into();
        self
    }

    /// Transactions this call occupies in a group.
    fn group_len(&self) -> usize {
        1 + self.method.txn_arg_count()
    }
}

/// Decoded return of one method call.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiReturn {
    pub tx_id: String,
    pub method: Method,
    /// Return bytes with the ARC-4 prefix removed; empty for void methods.
    pub raw: Vec<u8>,
    pub value: Option<AbiValue>,
}

#[derive(Debug, Clone)]
pub struct ComposerResult {
    pub confirmed_round: u64,
    pub tx_ids: Vec<String>,
    pub method_results: Vec<AbiReturn>,
}

#[derive(Debug, Clone)]
pub struct SimulateResult {
    pub method_results: Vec<AbiReturn>,
    pub budget_consumed: u64,
    pub budget_added: u64,
}

enum Entry {
    Txn(TransactionWithSigner),
    Call(MethodCall),
}

impl Entry {
    fn group_len(&self) -> usize {
        match self {
            Entry::Txn(_) => 1,
            Entry::Call(call) => call.group_len(),
        }
    }
}

/// Signed group plus the position and method of every ABI call in it.
struct BuiltGroup {
    signed: Vec<SignedTransaction>,
    calls: Vec<(usize, Method)>,
}

#[derive(Default)]
pub struct AtomicComposer {
    entries: Vec<Entry>,
}

impl AtomicComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions the group will hold.
    pub fn len(&self) -> usize {
        self.entries.iter().map(Entry::group_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: Entry) -> Result<&mut Self, Error> {
        let size = self.len() + entry.group_len();
        if size > MAX_GROUP_SIZE {
            return Err(Error::Composer(format!(
                "group of {size} exceeds the limit of {MAX_GROUP_SIZE}"
            )));
        }
        self.entries.push(entry);
        Ok(self)
    }

    pub fn add_transaction(&mut self, txn: TransactionWithSigner) -> Result<&mut Self, Error> {
        self.push(Entry::Txn(txn))
    }

    pub fn add_method_call(&mut self, call: MethodCall) -> Result<&mut Self, Error> {
        if call.args.len() != call.method.args.len() {
            return Err(Error::Composer(format!(
                "{} expects {} args, got {}",
                call.method.name,
                call.method.args.len(),
                call.args.len()
            )));
        }
        self.push(Entry::Call(call))
    }

    async fn build(self, ledger: &dyn Ledger) -> Result<BuiltGroup, Error> {
        if self.entries.is_empty() {
            return Err(Error::Composer("nothing to submit".into()));
        }
        let params = ledger.suggested_params().await?;
        let mut txns = Vec::new();
        let mut signers = Vec::new();
        let mut calls = Vec::new();

        for entry in self.entries {
            let call = match entry {
                Entry::Txn(t) => {
                    txns.push(t.txn);
                    signers.push(t.signer);
                    continue;
                }
                Entry::Call(call) => call,
            };

            let mut app_args = vec![call.method.selector().to_vec()];
            for (i, (ty, arg)) in call.method.args.iter().zip(call.args).enumerate() {
                match (ty, arg) {
                    (ArgType::Abi(abi), MethodArg::Abi(value)) => app_args.push(abi.encode(&value)?),
                    (ArgType::Txn(kind), MethodArg::Txn(t)) if txn_matches(kind, &t.txn) => {
                        txns.push(t.txn);
                        signers.push(t.signer);
                    }
                    (ty, _) => {
                        return Err(Error::Composer(format!(
                            "argument {i} of {} must be {ty}",
                            call.method.name
                        )))
                    }
                }
            }

            let app_call = AppCall {
                app_id: call.app_id,
                args: app_args,
                boxes: call.boxes,
                ..AppCall::default()
            };
            txns.push(
                Transaction::app_call(call.sender.address(), app_call, &params).with_note(call.note),
            );
            signers.push(call.sender);
            calls.push((txns.len() - 1, call.method));
        }

        assign_group_id(&mut txns)?;
        let signed = txns
            .into_iter()
            .zip(&signers)
            .map(|(txn, signer)| txn.sign(signer))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BuiltGroup { signed, calls })
    }

    /// Submit the group and wait for confirmation.
    pub async fn execute(self, ledger: &dyn Ledger) -> Result<ComposerResult, Error> {
        let built = self.build(ledger).await?;
        let outcome = ledger.send_group(built.signed).await?;
        debug!(
            round = outcome.confirmed_round,
            txns = outcome.txns.len(),
            "Group confirmed"
        );
        Ok(ComposerResult {
            confirmed_round: outcome.confirmed_round,
            tx_ids: outcome.txns.iter().map(|t| t.tx_id.clone()).collect(),
            method_results: decode_returns(built.calls, &outcome.txns)?,
        })
    }

    /// Run the group without committing anything.
    pub async fn simulate(self, ledger: &dyn Ledger) -> Result<SimulateResult, Error> {
        let built = self.build(ledger).await?;
        let outcome = ledger.simulate_group(built.signed).await?;
        Ok(SimulateResult {
            method_results: decode_returns(built.calls, &outcome.txns)?,
            budget_consumed: outcome.budget_consumed,
            budget_added: outcome.budget_added,
        })
    }
}

fn txn_matches(kind: &str, txn: &Transaction) -> bool {
    match kind {
        "txn" => true,
        "pay" => matches!(txn.kind, TxnKind::Payment { .. }),
        "appl" => matches!(txn.kind, TxnKind::ApplicationCall(_)),
        _ => false,
    }
}

fn decode_returns(calls: Vec<(usize, Method)>, txns: &[TxnResult]) -> Result<Vec<AbiReturn>, Error> {
    calls
        .into_iter()
        .map(|(index, method)| {
            let result = txns.get(index).ok_or_else(|| {
                Error::Composer(format!("no result for {} at index {index}", method.name))
            })?;
            let raw = result
                .logs
                .last()
                .and_then(|log| log.strip_prefix(&RETURN_PREFIX[..]))
                .map(<[u8]>::to_vec);
            let value = match (&method.returns, &raw) {
                (None, _) => None,
                (Some(ty), Some(raw)) => Some(ty.decode(raw)?),
                (Some(_), None) => {
                    return Err(Error::Composer(format!(
                        "{} returned no value in transaction {}",
                        method.name, result.tx_id
                    )))
                }
            };
            Ok(AbiReturn {
                tx_id: result.tx_id.clone(),
                method,
                raw: raw.unwrap_or_default(),
                value,
            })
        })
        .collect()
}
