//! Transactions, canonical msgpack encoding, ids, signing and grouping.
//!
//! The wire form is msgpack with keys in lexicographic order and empty or zero
//! fields omitted. Signatures and ids are computed over `"TX" || encoding`.

use crate::{Account, Error};
use data_encoding::BASE32_NOPAD;
use ed25519_dalek::{Signature, VerifyingKey};
use game_types::{sha512_256, Address};
use serde::Serialize;
use serde_bytes::ByteBuf;

const TX_TAG: &[u8] = b"TX";
const GROUP_TAG: &[u8] = b"TG";

/// Maximum number of transactions in an atomic group.
pub const MAX_GROUP_SIZE: usize = 16;
/// Validity window used when building transactions from suggested params.
pub const VALIDITY_WINDOW: u64 = 1_000;

/// Network parameters needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub const fn new(num_uints: u64, num_byte_slices: u64) -> Self {
        Self {
            num_uints,
            num_byte_slices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_uints == 0 && self.num_byte_slices == 0
    }

    /// True when `self` needs slots `existing` does not have.
    pub fn exceeds(&self, existing: &StateSchema) -> bool {
        self.num_uints > existing.num_uints || self.num_byte_slices > existing.num_byte_slices
    }
}

/// Box an application call may touch. `app_index` 0 means the called app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoxReference {
    pub app_index: u64,
    pub name: Vec<u8>,
}

impl BoxReference {
    pub fn own(name: impl Into<Vec<u8>>) -> Self {
        Self {
            app_index: 0,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnComplete {
    #[default]
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppCall {
    /// 0 creates a new application.
    pub app_id: u64,
    pub on_complete: OnComplete,
    pub args: Vec<Vec<u8>>,
    pub boxes: Vec<BoxReference>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnKind {
    Payment { receiver: Address, amount: u64 },
    ApplicationCall(AppCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Vec<u8>,
    pub group: Option<[u8; 32]>,
    pub kind: TxnKind,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[derive(Serialize)]
struct WireSchema {
    #[serde(skip_serializing_if = "is_zero")]
    nbs: u64,
    #[serde(skip_serializing_if = "is_zero")]
    nui: u64,
}

#[derive(Serialize)]
struct WireBoxRef {
    #[serde(skip_serializing_if = "is_zero")]
    i: u64,
    n: ByteBuf,
}

/// Field names are the protocol's short keys, declared in sorted order.
#[derive(Serialize)]
struct WireTxn {
    #[serde(skip_serializing_if = "is_zero")]
    amt: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    apaa: Vec<ByteBuf>,
    #[serde(skip_serializing_if = "is_zero")]
    apan: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    apap: Option<ByteBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    apbx: Vec<WireBoxRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apgs: Option<WireSchema>,
    #[serde(skip_serializing_if = "is_zero")]
    apid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    apls: Option<WireSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apsu: Option<ByteBuf>,
    #[serde(skip_serializing_if = "is_zero")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fv: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    gen: String,
    gh: ByteBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    grp: Option<ByteBuf>,
    #[serde(skip_serializing_if = "is_zero")]
    lv: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<ByteBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rcv: Option<ByteBuf>,
    snd: ByteBuf,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct WireSigned {
    sig: ByteBuf,
    txn: WireTxn,
}

#[derive(Serialize)]
struct WireGroup {
    txlist: Vec<ByteBuf>,
}

fn non_empty(bytes: &[u8]) -> Option<ByteBuf> {
    (!bytes.is_empty()).then(|| ByteBuf::from(bytes.to_vec()))
}

fn schema(s: &StateSchema) -> Option<WireSchema> {
    (!s.is_empty()).then_some(WireSchema {
        nbs: s.num_byte_slices,
        nui: s.num_uints,
    })
}

impl Transaction {
    fn with_params(sender: Address, params: &SuggestedParams, kind: TxnKind) -> Self {
        Self {
            sender,
            fee: params.min_fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note: Vec::new(),
            group: None,
            kind,
        }
    }

    pub fn payment(sender: Address, receiver: Address, amount: u64, params: &SuggestedParams) -> Self {
        Self::with_params(sender, params, TxnKind::Payment { receiver, amount })
    }

    pub fn app_call(sender: Address, call: AppCall, params: &SuggestedParams) -> Self {
        Self::with_params(sender, params, TxnKind::ApplicationCall(call))
    }

    pub fn with_note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = note.into();
        self
    }

    pub fn as_app_call(&self) -> Option<&AppCall> {
        match &self.kind {
            TxnKind::ApplicationCall(call) => Some(call),
            TxnKind::Payment { .. } => None,
        }
    }

    fn to_wire(&self) -> WireTxn {
        let mut wire = WireTxn {
            amt: 0,
            apaa: Vec::new(),
            apan: 0,
            apap: None,
            apbx: Vec::new(),
            apgs: None,
            apid: 0,
            apls: None,
            apsu: None,
            fee: self.fee,
            fv: self.first_valid,
            gen: self.genesis_id.clone(),
            gh: ByteBuf::from(self.genesis_hash.to_vec()),
            grp: self.group.map(|g| ByteBuf::from(g.to_vec())),
            lv: self.last_valid,
            note: non_empty(&self.note),
            rcv: None,
            snd: ByteBuf::from(self.sender.as_bytes().to_vec()),
            kind: "pay",
        };
        match &self.kind {
            TxnKind::Payment { receiver, amount } => {
                wire.amt = *amount;
                wire.rcv = Some(ByteBuf::from(receiver.as_bytes().to_vec()));
            }
            TxnKind::ApplicationCall(call) => {
                wire.kind = "appl";
                wire.apaa = call.args.iter().cloned().map(ByteBuf::from).collect();
                wire.apan = call.on_complete as u64;
                wire.apap = non_empty(&call.approval_program);
                wire.apbx = call
                    .boxes
                    .iter()
                    .map(|b| WireBoxRef {
                        i: b.app_index,
                        n: ByteBuf::from(b.name.clone()),
                    })
                    .collect();
                wire.apgs = schema(&call.global_schema);
                wire.apid = call.app_id;
                wire.apls = schema(&call.local_schema);
                wire.apsu = non_empty(&call.clear_program);
            }
        }
        wire
    }

    /// Canonical msgpack encoding of the unsigned transaction.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(rmp_serde::to_vec_named(&self.to_wire())?)
    }

    pub fn bytes_to_sign(&self) -> Result<Vec<u8>, Error> {
        let mut out = TX_TAG.to_vec();
        out.extend(self.encode()?);
        Ok(out)
    }

    pub fn raw_id(&self) -> Result<[u8; 32], Error> {
        Ok(sha512_256(&self.bytes_to_sign()?))
    }

    /// Base32 transaction id.
    pub fn id(&self) -> Result<String, Error> {
        Ok(BASE32_NOPAD.encode(&self.raw_id()?))
    }

    pub fn sign(self, signer: &Account) -> Result<SignedTransaction, Error> {
        let sig = signer.sign_bytes(&self.bytes_to_sign()?);
        Ok(SignedTransaction { txn: self, sig })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub sig: [u8; 64],
}

impl Serialize for SignedTransaction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireSigned {
            sig: ByteBuf::from(self.sig.to_vec()),
            txn: self.txn.to_wire(),
        }
        .serialize(serializer)
    }
}

impl SignedTransaction {
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn id(&self) -> Result<String, Error> {
        self.txn.id()
    }

    /// Check the signature against the sender's public key.
    pub fn verify(&self) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(self.txn.sender.as_bytes()) else {
            return false;
        };
        let Ok(message) = self.txn.bytes_to_sign() else {
            return false;
        };
        key.verify_strict(&message, &Signature::from_bytes(&self.sig))
            .is_ok()
    }
}

/// Group id over transactions whose `group` field is unset.
pub fn compute_group_id(txns: &[Transaction]) -> Result<[u8; 32], Error> {
    let txlist = txns
        .iter()
        .map(|t| {
            let mut bare = t.clone();
            bare.group = None;
            bare.raw_id().map(|id| ByteBuf::from(id.to_vec()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut preimage = GROUP_TAG.to_vec();
    preimage.extend(rmp_serde::to_vec_named(&WireGroup { txlist })?);
    Ok(sha512_256(&preimage))
}

/// Stamp a shared group id on every transaction. Single transactions stay ungrouped.
pub fn assign_group_id(txns: &mut [Transaction]) -> Result<Option<[u8; 32]>, Error> {
    if txns.len() > MAX_GROUP_SIZE {
        return Err(Error::Composer(format!(
            "group of {} exceeds the limit of {MAX_GROUP_SIZE}",
            txns.len()
        )));
    }
    if txns.len() < 2 {
        return Ok(None);
    }
    let gid = compute_group_id(txns)?;
    for txn in txns.iter_mut() {
        txn.group = Some(gid);
    }
    Ok(Some(gid))
}
