//! Typed errors for the game contract.
//!
//! A method returning `Err` rejects the whole transaction group; the ledger
//! reports the `Display` message as the rejection reason.

use game_types::AbiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Caller lacks permission.
    Unauthorized(String),
    /// Invalid arguments or malformed call.
    InvalidInput(String),
    /// Requested record does not exist.
    NotFound(String),
    /// Operation not allowed given current contract state.
    InvalidState(String),
    /// Game balance too low for a purchase.
    InsufficientBalance { needed: u64, available: u64 },
    /// Rejected by the executing environment (budget, box references, ...).
    Runtime(String),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            Self::InsufficientBalance { needed, available } => {
                write!(f, "Insufficient balance: needed {needed}, available {available}")
            }
            Self::Runtime(msg) => write!(f, "Runtime error: {msg}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<AbiError> for GameError {
    fn from(e: AbiError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

// ── Factory helpers for common errors ────────────────────────────────────────

impl GameError {
    pub fn user_not_registered() -> Self {
        Self::NotFound("User not registered".into())
    }
    pub fn user_already_registered() -> Self {
        Self::InvalidState("User already registered".into())
    }
    pub fn asset_not_found() -> Self {
        Self::NotFound("Asset not found".into())
    }
    pub fn only_creator() -> Self {
        Self::Unauthorized("Only the application creator can perform this action".into())
    }
    pub fn overflow(what: &str) -> Self {
        Self::InvalidInput(format!("{what} overflows uint64"))
    }
}
