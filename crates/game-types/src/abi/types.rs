use crate::AbiError;
use std::fmt;
use std::str::FromStr;

/// ABI type, parsed from its canonical string form (`"(uint64,string,uint64)"`).
///
/// Integers are limited to 64 bits; wider `uintN` types are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint(u16),
    Byte,
    Bool,
    Address,
    String,
    StaticArray(Box<AbiType>, usize),
    DynamicArray(Box<AbiType>),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        s.parse()
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::DynamicArray(_) => true,
            Self::StaticArray(elem, _) => elem.is_dynamic(),
            Self::Tuple(elems) => elems.iter().any(Self::is_dynamic),
            Self::Uint(_) | Self::Byte | Self::Bool | Self::Address => false,
        }
    }

    /// Encoded length of a static type. `None` for dynamic types.
    pub fn static_len(&self) -> Option<usize> {
        match self {
            Self::Uint(bits) => Some(usize::from(*bits) / 8),
            Self::Byte | Self::Bool => Some(1),
            Self::Address => Some(32),
            Self::String | Self::DynamicArray(_) => None,
            Self::StaticArray(elem, len) => {
                if **elem == Self::Bool {
                    Some(len.div_ceil(8))
                } else {
                    elem.static_len().map(|l| l * len)
                }
            }
            Self::Tuple(elems) => {
                let mut total = 0;
                let mut i = 0;
                while i < elems.len() {
                    if elems[i] == Self::Bool {
                        i += bool_run(&elems[i..]);
                        total += 1;
                    } else {
                        total += elems[i].static_len()?;
                        i += 1;
                    }
                }
                Some(total)
            }
        }
    }
}

/// Length of the run of consecutive `bool` members starting at `elems[0]`, capped at 8
/// (one packed byte).
pub(crate) fn bool_run(elems: &[AbiType]) -> usize {
    elems
        .iter()
        .take(8)
        .take_while(|t| **t == AbiType::Bool)
        .count()
}

fn split_top_level(inner: &str) -> Result<Vec<&str>, AbiError> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(AbiError::InvalidType(format!("unbalanced parens in {inner}")));
                }
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AbiError::InvalidType(format!("unbalanced parens in {inner}")));
    }
    parts.push(&inner[start..]);
    Ok(parts)
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with(']') {
            let open = s
                .rfind('[')
                .ok_or_else(|| AbiError::InvalidType(s.to_string()))?;
            let elem: AbiType = s[..open].parse()?;
            let len = &s[open + 1..s.len() - 1];
            return if len.is_empty() {
                Ok(Self::DynamicArray(Box::new(elem)))
            } else {
                let n = len
                    .parse::<usize>()
                    .map_err(|_| AbiError::InvalidType(format!("bad array length in {s}")))?;
                Ok(Self::StaticArray(Box::new(elem), n))
            };
        }

        if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            if inner.is_empty() {
                return Ok(Self::Tuple(Vec::new()));
            }
            let elems = split_top_level(inner)?
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::Tuple(elems));
        }

        match s {
            "byte" => Ok(Self::Byte),
            "bool" => Ok(Self::Bool),
            "address" => Ok(Self::Address),
            "string" => Ok(Self::String),
            _ => {
                let bits = s
                    .strip_prefix("uint")
                    .and_then(|n| n.parse::<u16>().ok())
                    .ok_or_else(|| AbiError::InvalidType(format!("unknown type {s:?}")))?;
                if bits == 0 || bits % 8 != 0 || bits > 64 {
                    return Err(AbiError::InvalidType(format!(
                        "unsupported integer width in {s}"
                    )));
                }
                Ok(Self::Uint(bits))
            }
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Byte => f.write_str("byte"),
            Self::Bool => f.write_str("bool"),
            Self::Address => f.write_str("address"),
            Self::String => f.write_str("string"),
            Self::StaticArray(elem, n) => write!(f, "{elem}[{n}]"),
            Self::DynamicArray(elem) => write!(f, "{elem}[]"),
            Self::Tuple(elems) => {
                f.write_str("(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str(")")
            }
        }
    }
}
