//! Dynamic values held in contract storage
//!
//! Storage fields, method arguments and return values are all [`Value`]s.
//! Equality and ordering are structural and live in [`crate::core::ordering`].

use crate::core::address::Address;
use crate::core::error::{fail, ExecResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static NULL: Value = Value::Null;

/// A tagged dynamic value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Uint(u128),
    /// Only negative integers are kept here; see [`Value::int`]
    Int(i128),
    String(String),
    Binary(#[serde(with = "hex_bytes")] Vec<u8>),
    Address(Address),
    Array(Vec<Value>),
    Map(#[serde(with = "map_entries")] BTreeMap<Value, Value>),
}

impl Value {
    /// Signed integer, normalized to `Uint` when non-negative
    pub fn int(value: i128) -> Self {
        if value >= 0 {
            Value::Uint(value as u128)
        } else {
            Value::Int(value)
        }
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Map keyed by strings, for record-like values
    pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Value::Map(
            fields
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        )
    }

    /// Name reported by `typeof`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Address(_) => "address",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Uint(_) | Value::Int(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Value::Uint(n) => Some(*n),
            Value::Int(n) if *n >= 0 => Some(*n as u128),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<Value, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Field lookup on a map value; anything missing reads as null
    pub fn get(&self, key: impl Into<Value>) -> &Value {
        match self {
            Value::Map(map) => map.get(&key.into()).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Insert into a map value, turning null into an empty map first
    pub fn insert(&mut self, key: impl Into<Value>, value: Value) -> ExecResult<()> {
        if self.is_null() {
            *self = Value::map();
        }
        match self {
            Value::Map(map) => {
                map.insert(key.into(), value);
                Ok(())
            }
            other => fail(format!("cannot index into {}", other.type_name()), None),
        }
    }

    /// Element count of a sequence, map, string or binary
    ///
    /// Strings count characters, binaries count bytes.
    pub fn size(&self) -> ExecResult<usize> {
        match self {
            Value::Array(items) => Ok(items.len()),
            Value::Map(map) => Ok(map.len()),
            Value::String(s) => Ok(s.chars().count()),
            Value::Binary(b) => Ok(b.len()),
            other => fail(format!("size() of {}", other.type_name()), None),
        }
    }

    /// Append to an array value
    pub fn push(&mut self, value: Value) -> ExecResult<()> {
        match self {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => fail(format!("push() on {}", other.type_name()), None),
        }
    }

    /// Convert a JSON document, as given on the command line
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::Uint(u as u128)
                } else if let Some(i) = n.as_i64() {
                    Value::int(i as i128)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Binary(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Address(a) => write!(f, "{}", a),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.fmt_nested(f)?;
                    f.write_str(": ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n as u128)
    }
}

impl From<u128> for Value {
    fn from(n: u128) -> Self {
        Value::Uint(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n as i128)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

// Map keys are values, not strings, so maps go to JSON as entry lists.
mod map_entries {
    use super::Value;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<Value, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Value, Value>, D::Error> {
        let entries: Vec<(Value, Value)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
