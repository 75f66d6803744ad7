//! Pure helper functions available to contract code
//!
//! These never touch state, so they are free functions over [`Value`] rather
//! than [`Runtime`](crate::contract::Runtime) methods. Every coercion fails the
//! call on bad input.

use crate::core::{fail, Address, Amount, ExecResult, Value};
use crate::crypto;

/// Normalize a value to an [`Address`]; null is the native currency
pub fn bech32(value: &Value) -> ExecResult<Address> {
    match value {
        Value::Null => Ok(Address::NATIVE),
        Value::Address(address) => Ok(*address),
        Value::String(s) => {
            Address::parse(s).or_else(|e| fail(format!("invalid address {:?}: {}", s, e), None))
        }
        Value::Binary(bytes) => {
            Address::from_slice(bytes).or_else(|e| fail(format!("invalid address: {}", e), None))
        }
        other => fail(format!("cannot convert {} to address", other.type_name()), None),
    }
}

/// Coerce to a non-negative amount
///
/// Accepts integers and decimal or `0x`-prefixed hex strings.
pub fn uint(value: &Value) -> ExecResult<Amount> {
    match value {
        Value::Uint(n) => Ok(*n),
        Value::Int(n) => fail(format!("negative amount: {}", n), None),
        Value::String(s) => parse_uint(s.trim()),
        other => fail(format!("cannot convert {} to uint", other.type_name()), None),
    }
}

fn parse_uint(s: &str) -> ExecResult<Amount> {
    let parsed = match s.strip_prefix("0x") {
        Some(digits) => Amount::from_str_radix(digits, 16),
        None => s.parse::<Amount>(),
    };
    parsed.or_else(|_| fail(format!("invalid uint: {:?}", s), None))
}

/// Coerce to raw bytes; strings are read as hex
pub fn binary(value: &Value) -> ExecResult<Vec<u8>> {
    match value {
        Value::Binary(bytes) => Ok(bytes.clone()),
        Value::Address(address) => Ok(address.as_bytes().to_vec()),
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(digits).or_else(|_| fail(format!("invalid hex: {:?}", s), None))
        }
        other => fail(format!("cannot convert {} to binary", other.type_name()), None),
    }
}

/// Lowercase hex of a binary value, without prefix
pub fn binary_hex(value: &Value) -> ExecResult<String> {
    Ok(hex::encode(binary(value)?))
}

pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

pub fn size(value: &Value) -> ExecResult<Amount> {
    value.size().map(|n| n as Amount)
}

/// Append to an array, returning the new array
pub fn push(array: &Value, item: Value) -> ExecResult<Value> {
    let mut out = array.clone();
    out.push(item)?;
    Ok(out)
}

pub fn type_of(value: &Value) -> &'static str {
    value.type_name()
}

pub fn to_string(value: &Value) -> String {
    value.to_string()
}

pub fn sha256(value: &Value) -> ExecResult<Value> {
    Ok(Value::Binary(crypto::sha256(&binary(value)?)))
}

/// Signature check over `signer`; malformed inputs give `false`
pub fn ecdsa_verify(signer: &Value, public_key: &Value, signature: &Value) -> bool {
    let (Ok(signer), Ok(key), Ok(signature)) =
        (bech32(signer), binary(public_key), binary(signature))
    else {
        return false;
    };
    crypto::ecdsa_verify(&signer, &key, &signature)
}

/// Stable ascending copy of an array
pub fn sort(value: &Value) -> ExecResult<Value> {
    match value.as_array() {
        Some(items) => Ok(Value::Array(crate::core::sort(items))),
        None => fail(format!("sort() of {}", value.type_name()), None),
    }
}

pub fn reverse(value: &Value) -> ExecResult<Value> {
    match value.as_array() {
        Some(items) => Ok(Value::Array(crate::core::reverse(items))),
        None => fail(format!("reverse() of {}", value.type_name()), None),
    }
}
