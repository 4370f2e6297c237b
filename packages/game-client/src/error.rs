//! Error types for the game client.

use game_types::AbiError;
use std::fmt;

/// Client error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Transport failure talking to algod or the indexer.
    Http(String),
    /// The node answered with an error status (404 for missing boxes and apps,
    /// 400 for rejected transactions, 500 for ledger faults).
    Algod { status: u16, message: String },
    /// Wire encoding or decoding failure.
    Encode(String),
    /// ABI codec failure.
    Abi(AbiError),
    /// Group construction error (arity, size, missing return).
    Composer(String),
    /// Deployment refused by policy or failed.
    Deploy(String),
    /// Key store read/write failure.
    KeyStore(String),
}

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Algod {
            status: 404,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Algod {
            status: 400,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Algod {
            status: 500,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Algod { status: 404, .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Http(msg) => write!(f, "http error: {msg}"),
            Error::Algod { status, message } => write!(f, "algod error {status}: {message}"),
            Error::Encode(msg) => write!(f, "encoding error: {msg}"),
            Error::Abi(e) => write!(f, "{e}"),
            Error::Composer(msg) => write!(f, "composer error: {msg}"),
            Error::Deploy(msg) => write!(f, "deploy error: {msg}"),
            Error::KeyStore(msg) => write!(f, "key store error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<AbiError> for Error {
    fn from(e: AbiError) -> Self {
        Error::Abi(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Encode(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encode(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Encode(format!("invalid base64: {e}"))
    }
}
