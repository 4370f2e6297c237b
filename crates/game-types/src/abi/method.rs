use super::types::AbiType;
use crate::{sha512_256, AbiError};
use std::fmt;

/// Prefix marking the log entry that carries a method's return value.
pub const RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// Method argument: either an ABI value passed in application args, or a
/// transaction that must precede the call in its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Abi(AbiType),
    /// `txn`, `pay`, `axfer`, `appl`...
    Txn(String),
}

const TXN_ARG_TYPES: [&str; 7] = ["txn", "pay", "keyreg", "acfg", "axfer", "afrz", "appl"];

/// ARC-4 method descriptor built from its signature,
/// e.g. `register(string)(uint64,string,uint64)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub args: Vec<ArgType>,
    /// `None` for `void`.
    pub returns: Option<AbiType>,
}

impl Method {
    pub fn parse(signature: &str) -> Result<Self, AbiError> {
        let open = signature
            .find('(')
            .ok_or_else(|| AbiError::InvalidType(format!("no argument list in {signature}")))?;
        let name = &signature[..open];
        if name.is_empty() {
            return Err(AbiError::InvalidType(format!("no method name in {signature}")));
        }

        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in signature[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close =
            close.ok_or_else(|| AbiError::InvalidType(format!("unbalanced parens in {signature}")))?;

        let args = split_args(&signature[open + 1..close])?;

        let returns = match &signature[close + 1..] {
            "void" => None,
            "" => return Err(AbiError::InvalidType(format!("no return type in {signature}"))),
            ret => Some(ret.parse()?),
        };

        Ok(Self {
            name: name.to_string(),
            args,
            returns,
        })
    }

    pub fn signature(&self) -> String {
        self.to_string()
    }

    /// First four bytes of `sha512_256(signature)`.
    pub fn selector(&self) -> [u8; 4] {
        let digest = sha512_256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// ABI-typed arguments, i.e. the ones carried in application args.
    pub fn abi_args(&self) -> impl Iterator<Item = &AbiType> {
        self.args.iter().filter_map(|a| match a {
            ArgType::Abi(t) => Some(t),
            ArgType::Txn(_) => None,
        })
    }

    pub fn txn_arg_count(&self) -> usize {
        self.args.iter().filter(|a| matches!(a, ArgType::Txn(_))).count()
    }
}

fn split_args(list: &str) -> Result<Vec<ArgType>, AbiError> {
    if list.is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts
        .into_iter()
        .map(|part| {
            if TXN_ARG_TYPES.contains(&part) {
                Ok(ArgType::Txn(part.to_string()))
            } else {
                part.parse().map(ArgType::Abi)
            }
        })
        .collect()
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Abi(t) => write!(f, "{t}"),
            ArgType::Txn(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")?;
        match &self.returns {
            Some(t) => write!(f, "{t}"),
            None => f.write_str("void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        let m = Method::parse("register(string)(uint64,string,uint64)").unwrap();
        assert_eq!(m.name, "register");
        assert_eq!(m.args, vec![ArgType::Abi(AbiType::String)]);
        assert_eq!(m.returns, Some(AbiType::parse("(uint64,string,uint64)").unwrap()));
        assert_eq!(m.signature(), "register(string)(uint64,string,uint64)");
    }

    #[test]
    fn test_parse_transaction_argument() {
        let m = Method::parse("fund_account(pay)uint64").unwrap();
        assert_eq!(m.args, vec![ArgType::Txn("pay".into())]);
        assert_eq!(m.txn_arg_count(), 1);
        assert_eq!(m.abi_args().count(), 0);
    }

    #[test]
    fn test_parse_tuple_argument_and_void() {
        let m = Method::parse("admin_upsert_asset((string,string,uint64))void").unwrap();
        assert_eq!(m.args.len(), 1);
        assert_eq!(m.returns, None);
        assert_eq!(m.to_string(), "admin_upsert_asset((string,string,uint64))void");
    }

    #[test]
    fn test_selector_known_vector() {
        // ARC-4 reference: "add(uint64,uint64)uint128" -> 0x8aa3b61f
        assert_eq!(hex::encode(&sha512_256(b"add(uint64,uint64)uint128")[..4]), "8aa3b61f");

        let m = Method::parse("hello(string)string").unwrap();
        assert_eq!(m.selector()[..], sha512_256(b"hello(string)string")[..4]);
    }

    #[test]
    fn test_rejects_malformed_signatures() {
        for sig in ["register", "(string)void", "register(string", "register(string)", "f(foo)void"] {
            assert!(Method::parse(sig).is_err(), "{sig} should not parse");
        }
    }
}
