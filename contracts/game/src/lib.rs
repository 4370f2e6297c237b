//! Game contract: players register a profile, fund it with payments to the
//! application account, and spend the balance on assets the creator lists.
//!
//! All state is kept in boxes (see [`game_types::boxes`]). The contract is
//! written against [`Runtime`] so any ledger implementing the host interface
//! can execute it.

use crate::constants::*;
use game_types::{AbiRecord, AbiType, AbiValue, Asset, Method, RETURN_PREFIX};

mod asset;
pub mod constants;
mod env;
pub mod errors;
mod user;

pub use env::{GroupTxn, Runtime};
pub use errors::GameError;

/// ARC-4 signatures of every method the contract routes.
pub const HELLO: &str = "hello(string)string";
pub const REGISTER: &str = "register(string)(uint64,string,uint64)";
pub const FUND_ACCOUNT: &str = "fund_account(pay)uint64";
pub const ADMIN_UPSERT_ASSET: &str = "admin_upsert_asset((string,string,uint64))void";
pub const BUY_ASSET: &str = "buy_asset(byte[32],uint64)void";

pub const METHODS: [&str; 5] = [HELLO, REGISTER, FUND_ACCOUNT, ADMIN_UPSERT_ASSET, BUY_ASSET];

pub struct GameContract<'a, R: Runtime> {
    rt: &'a mut R,
}

impl<'a, R: Runtime> GameContract<'a, R> {
    pub fn new(rt: &'a mut R) -> Self {
        Self { rt }
    }

    pub fn hello(&mut self, name: String) -> Result<String, GameError> {
        Ok(format!("{GREETING_PREFIX}{name}"))
    }

    /// Route an application call.
    ///
    /// `args[0]` is the method selector; the remaining args are the ABI-encoded
    /// arguments. Returns the log line carrying the return value, if any. A
    /// call without args is the bare create/no-op call and does nothing.
    pub fn dispatch(&mut self, args: &[Vec<u8>]) -> Result<Option<Vec<u8>>, GameError> {
        let Some(selector) = args.first() else {
            return Ok(None);
        };
        self.rt.consume(ROUTE_COST)?;

        let method = METHODS
            .iter()
            .map(|sig| Method::parse(sig))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .find(|m| m.selector()[..] == selector[..])
            .ok_or_else(|| {
                GameError::InvalidInput(format!("unknown method selector {selector:02x?}"))
            })?;

        let abi_args: Vec<&AbiType> = method.abi_args().collect();
        if args.len() - 1 != abi_args.len() {
            return Err(GameError::InvalidInput(format!(
                "{} expects {} args, got {}",
                method.name,
                abi_args.len(),
                args.len() - 1
            )));
        }
        let mut values = Vec::with_capacity(abi_args.len());
        for (ty, raw) in abi_args.iter().zip(&args[1..]) {
            self.rt.consume(ARG_DECODE_COST)?;
            values.push(ty.decode(raw)?);
        }

        let returned = self.invoke(&method.name, values)?;

        match (&method.returns, returned) {
            (Some(ty), Some(value)) => {
                self.rt.consume(RETURN_COST)?;
                let mut log = RETURN_PREFIX.to_vec();
                log.extend(ty.encode(&value)?);
                Ok(Some(log))
            }
            (None, None) => Ok(None),
            _ => Err(GameError::Runtime(format!(
                "{} returned a value that does not match its signature",
                method.name
            ))),
        }
    }

    fn invoke(&mut self, name: &str, values: Vec<AbiValue>) -> Result<Option<AbiValue>, GameError> {
        let mut values = values.into_iter();
        let mut next = || {
            values
                .next()
                .ok_or_else(|| GameError::InvalidInput(format!("missing argument for {name}")))
        };

        match name {
            "hello" => {
                let who = string_arg(next()?)?;
                self.hello(who).map(|s| Some(AbiValue::String(s)))
            }
            "register" => {
                let player = string_arg(next()?)?;
                self.register(player).map(|user| Some(user.to_abi()))
            }
            "fund_account" => self.fund_account().map(|b| Some(AbiValue::Uint(b))),
            "admin_upsert_asset" => {
                let asset = Asset::from_abi(next()?)?;
                self.admin_upsert_asset(asset).map(|()| None)
            }
            "buy_asset" => {
                let asset_id = next()?
                    .as_bytes()
                    .and_then(|b| <[u8; 32]>::try_from(b).ok())
                    .ok_or_else(|| GameError::InvalidInput("asset_id must be byte[32]".into()))?;
                let quantity = next()?
                    .as_u64()
                    .ok_or_else(|| GameError::InvalidInput("quantity must be uint64".into()))?;
                self.buy_asset(asset_id, quantity).map(|()| None)
            }
            other => Err(GameError::InvalidInput(format!("unrouted method {other}"))),
        }
    }
}

fn string_arg(value: AbiValue) -> Result<String, GameError> {
    match value {
        AbiValue::String(s) => Ok(s),
        other => Err(GameError::InvalidInput(format!("expected string, got {other:?}"))),
    }
}
