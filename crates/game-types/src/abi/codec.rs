use super::types::bool_run;
use super::{AbiType, AbiValue};
use crate::{AbiError, Address};

const LEN_PREFIX: usize = 2;

impl AbiType {
    pub fn encode(&self, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
        match (self, value) {
            (Self::Uint(bits), AbiValue::Uint(v)) => {
                let width = usize::from(*bits) / 8;
                if *bits < 64 && *v >> bits != 0 {
                    return Err(AbiError::Encode(format!("{v} overflows uint{bits}")));
                }
                Ok(v.to_be_bytes()[8 - width..].to_vec())
            }
            (Self::Byte, AbiValue::Byte(b)) => Ok(vec![*b]),
            (Self::Bool, AbiValue::Bool(b)) => Ok(vec![if *b { 0x80 } else { 0x00 }]),
            (Self::Address, AbiValue::Address(a)) => Ok(a.as_bytes().to_vec()),
            (Self::String, AbiValue::String(s)) => {
                let len = u16::try_from(s.len())
                    .map_err(|_| AbiError::Encode(format!("string of {} bytes", s.len())))?;
                let mut out = Vec::with_capacity(LEN_PREFIX + s.len());
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(s.as_bytes());
                Ok(out)
            }
            (Self::StaticArray(elem, n), AbiValue::Array(items)) => {
                if items.len() != *n {
                    return Err(AbiError::Encode(format!(
                        "{self} expects {n} elements, got {}",
                        items.len()
                    )));
                }
                encode_tuple(&vec![(**elem).clone(); *n], items)
            }
            (Self::DynamicArray(elem), AbiValue::Array(items)) => {
                let count = u16::try_from(items.len())
                    .map_err(|_| AbiError::Encode(format!("array of {} elements", items.len())))?;
                let mut out = count.to_be_bytes().to_vec();
                out.extend(encode_tuple(&vec![(**elem).clone(); items.len()], items)?);
                Ok(out)
            }
            (Self::Tuple(elems), AbiValue::Tuple(items)) => encode_tuple(elems, items),
            (ty, v) => Err(AbiError::Encode(format!("cannot encode {v:?} as {ty}"))),
        }
    }

    /// Decode `bytes`, which must hold exactly one value of this type.
    pub fn decode(&self, bytes: &[u8]) -> Result<AbiValue, AbiError> {
        if let Some(len) = self.static_len() {
            if bytes.len() != len {
                return Err(AbiError::Decode(format!(
                    "{self} needs {len} bytes, got {}",
                    bytes.len()
                )));
            }
        }
        match self {
            Self::Uint(_) => {
                let mut buf = [0u8; 8];
                buf[8 - bytes.len()..].copy_from_slice(bytes);
                Ok(AbiValue::Uint(u64::from_be_bytes(buf)))
            }
            Self::Byte => Ok(AbiValue::Byte(bytes[0])),
            Self::Bool => match bytes[0] {
                0x00 => Ok(AbiValue::Bool(false)),
                0x80 => Ok(AbiValue::Bool(true)),
                b => Err(AbiError::Decode(format!("invalid bool byte {b:#04x}"))),
            },
            Self::Address => Ok(AbiValue::Address(Address::from_slice(bytes)?)),
            Self::String => {
                let len = read_u16(bytes, 0)?;
                let body = &bytes[LEN_PREFIX..];
                if body.len() != len {
                    return Err(AbiError::Decode(format!(
                        "string declares {len} bytes, has {}",
                        body.len()
                    )));
                }
                String::from_utf8(body.to_vec())
                    .map(AbiValue::String)
                    .map_err(|e| AbiError::Decode(format!("string is not utf-8: {e}")))
            }
            Self::StaticArray(elem, n) => {
                decode_tuple(&vec![(**elem).clone(); *n], bytes).map(AbiValue::Array)
            }
            Self::DynamicArray(elem) => {
                let count = read_u16(bytes, 0)?;
                decode_tuple(&vec![(**elem).clone(); count], &bytes[LEN_PREFIX..])
                    .map(AbiValue::Array)
            }
            Self::Tuple(elems) => decode_tuple(elems, bytes).map(AbiValue::Tuple),
        }
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Result<usize, AbiError> {
    bytes
        .get(at..at + LEN_PREFIX)
        .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
        .ok_or_else(|| AbiError::Decode(format!("truncated u16 at offset {at}")))
}

fn encode_tuple(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::Encode(format!(
            "tuple expects {} elements, got {}",
            types.len(),
            values.len()
        )));
    }

    let mut heads: Vec<Vec<u8>> = Vec::new();
    let mut tails: Vec<Option<Vec<u8>>> = Vec::new();
    let mut i = 0;
    while i < types.len() {
        if types[i] == AbiType::Bool {
            let run = bool_run(&types[i..]);
            let mut packed = 0u8;
            for (bit, value) in values[i..i + run].iter().enumerate() {
                match value {
                    AbiValue::Bool(true) => packed |= 0x80 >> bit,
                    AbiValue::Bool(false) => {}
                    other => {
                        return Err(AbiError::Encode(format!("cannot encode {other:?} as bool")))
                    }
                }
            }
            heads.push(vec![packed]);
            tails.push(None);
            i += run;
        } else if types[i].is_dynamic() {
            heads.push(vec![0, 0]);
            tails.push(Some(types[i].encode(&values[i])?));
            i += 1;
        } else {
            heads.push(types[i].encode(&values[i])?);
            tails.push(None);
            i += 1;
        }
    }

    let mut offset: usize = heads.iter().map(Vec::len).sum();
    for (head, tail) in heads.iter_mut().zip(&tails) {
        if let Some(tail) = tail {
            let at = u16::try_from(offset)
                .map_err(|_| AbiError::Encode(format!("tuple offset {offset} overflows u16")))?;
            head.copy_from_slice(&at.to_be_bytes());
            offset += tail.len();
        }
    }
    if offset > usize::from(u16::MAX) {
        return Err(AbiError::Encode(format!("tuple of {offset} bytes overflows u16 offsets")));
    }

    let mut out = Vec::with_capacity(offset);
    for head in heads {
        out.extend(head);
    }
    for tail in tails.into_iter().flatten() {
        out.extend(tail);
    }
    Ok(out)
}

fn decode_tuple(types: &[AbiType], bytes: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let mut values: Vec<Option<AbiValue>> = vec![None; types.len()];
    let mut dynamic: Vec<(usize, usize)> = Vec::new();
    let mut pos = 0;
    let mut i = 0;

    while i < types.len() {
        if types[i] == AbiType::Bool {
            let run = bool_run(&types[i..]);
            let packed = *bytes
                .get(pos)
                .ok_or_else(|| AbiError::Decode("truncated bool".into()))?;
            for bit in 0..run {
                values[i + bit] = Some(AbiValue::Bool(packed & (0x80 >> bit) != 0));
            }
            pos += 1;
            i += run;
        } else if types[i].is_dynamic() {
            dynamic.push((i, read_u16(bytes, pos)?));
            pos += LEN_PREFIX;
            i += 1;
        } else {
            let len = types[i]
                .static_len()
                .ok_or_else(|| AbiError::Decode(format!("{} has no static length", types[i])))?;
            let chunk = bytes
                .get(pos..pos + len)
                .ok_or_else(|| AbiError::Decode(format!("truncated {}", types[i])))?;
            values[i] = Some(types[i].decode(chunk)?);
            pos += len;
            i += 1;
        }
    }

    if dynamic.is_empty() && pos != bytes.len() {
        return Err(AbiError::Decode(format!(
            "{} trailing bytes after tuple",
            bytes.len() - pos
        )));
    }

    for (k, &(index, start)) in dynamic.iter().enumerate() {
        let end = dynamic.get(k + 1).map_or(bytes.len(), |&(_, next)| next);
        if start < pos || end < start || end > bytes.len() {
            return Err(AbiError::Decode(format!(
                "invalid dynamic offset {start} for {}",
                types[index]
            )));
        }
        pos = start;
        values[index] = Some(types[index].decode(&bytes[start..end])?);
    }

    values
        .into_iter()
        .map(|v| v.ok_or_else(|| AbiError::Decode("missing tuple element".into())))
        .collect()
}
