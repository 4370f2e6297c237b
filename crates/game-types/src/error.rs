/// Codec and identifier error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// Type string could not be parsed.
    InvalidType(String),
    /// Value does not fit the type it is encoded as.
    Encode(String),
    /// Bytes do not match the type they are decoded as.
    Decode(String),
    /// Address text or bytes are malformed.
    InvalidAddress(String),
}

impl std::fmt::Display for AbiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidType(msg) => write!(f, "invalid abi type: {msg}"),
            Self::Encode(msg) => write!(f, "abi encode: {msg}"),
            Self::Decode(msg) => write!(f, "abi decode: {msg}"),
            Self::InvalidAddress(msg) => write!(f, "invalid address: {msg}"),
        }
    }
}

impl std::error::Error for AbiError {}
