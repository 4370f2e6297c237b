//! Contract-wide constants.

/// Every revision of the game's approval program starts with this tag.
pub const APPROVAL_FAMILY: &[u8] = b"\x0agame:approval:";
/// Current approval program.
pub const APPROVAL_PROGRAM: &[u8] = b"\x0agame:approval:v1";
pub const CLEAR_PROGRAM: &[u8] = b"\x0agame:clear:v1";

/// All state lives in boxes; no global or local state slots.
pub const GLOBAL_UINTS: u64 = 0;
pub const GLOBAL_BYTES: u64 = 0;
pub const LOCAL_UINTS: u64 = 0;
pub const LOCAL_BYTES: u64 = 0;

// Opcode costs charged against the group's pooled budget.
pub const ROUTE_COST: u64 = 12;
pub const ARG_DECODE_COST: u64 = 4;
pub const BOX_READ_COST: u64 = 6;
pub const BOX_WRITE_COST: u64 = 8;
pub const SHA256_COST: u64 = 35;
pub const RETURN_COST: u64 = 4;

pub const GREETING_PREFIX: &str = "Hello, ";
