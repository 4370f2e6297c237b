//! # Game client
//!
//! Typed client for the game contract plus the plumbing it stands on:
//! transactions and signing, the [`Ledger`] seam with an in-process
//! [`LocalNet`] and an HTTP [`AlgodHttp`] backend, named test accounts, the
//! atomic composer and idempotent deployment.
//!
//! ## Quick Start
//! ```bash
//! GAME_NETWORK=localnet cargo run --bin game
//! ```

pub mod account;
pub mod algod;
pub mod composer;
pub mod config;
pub mod deploy;
mod error;
mod game;
pub mod key_store;
pub mod ledger;
pub mod localnet;
pub mod transaction;

pub use account::{get_account, Account};
pub use algod::{AlgodHttp, IndexerHttp};
pub use composer::{AbiReturn, AtomicComposer, ComposerResult, MethodArg, MethodCall, SimulateResult};
pub use crate::config::{connect, Config, NetworkKind};
pub use deploy::{AppSpec, DeployOutcome, OnSchemaBreak, OnUpdate};
pub use error::Error;
pub use game::{CallResult, GameClient, GameComposer, TransactionParameters, TransactionWithSigner};
pub use key_store::KeyStore;
pub use ledger::{CreatedApp, GroupOutcome, Ledger, SimulateOutcome, TxnResult};
pub use localnet::LocalNet;
pub use transaction::{BoxReference, SignedTransaction, StateSchema, SuggestedParams, Transaction};

/// Microalgos per algo.
pub const MICROALGOS_PER_ALGO: u64 = 1_000_000;
