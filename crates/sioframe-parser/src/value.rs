//! Payload value model.
//!
//! A packet payload is a JSON tree that may additionally hold raw binary
//! leaves (before encoding, after reconstruction) or placeholders standing in
//! for them (on the wire, while attachments are pending).

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Number;

/// Key marking a placeholder object on the wire.
pub const PLACEHOLDER_KEY: &str = "isPlaceholder";

/// Key holding the attachment index of a placeholder object.
pub const INDEX_KEY: &str = "index";

/// A payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Raw bytes, carried out of band as an attachment.
    Binary(Vec<u8>),
    /// Stand-in for the attachment at this index.
    Placeholder(usize),
}

impl Value {
    /// Creates a binary leaf.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Converts JSON into a value, recognizing placeholder objects.
    ///
    /// Only binary packets may carry placeholders; everywhere else the same
    /// shape is an ordinary object and [`Value::from`] should be used.
    pub fn from_json_with_placeholders(json: serde_json::Value) -> Self {
        convert(json, true)
    }

    /// Returns true if any leaf of this tree is [`Value::Binary`].
    pub fn has_binary(&self) -> bool {
        match self {
            Self::Binary(_) => true,
            Self::Array(items) => items.iter().any(Self::has_binary),
            Self::Object(map) => map.values().any(Self::has_binary),
            Self::Null
            | Self::Bool(_)
            | Self::Number(_)
            | Self::String(_)
            | Self::Placeholder(_) => false,
        }
    }

    /// Returns the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the bytes if this is a binary leaf.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

fn convert(json: serde_json::Value, placeholders: bool) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert(item, placeholders))
                .collect(),
        ),
        serde_json::Value::Object(map) => {
            if placeholders {
                if let Some(index) = placeholder_index(&map) {
                    return Value::Placeholder(index);
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, convert(item, placeholders)))
                    .collect(),
            )
        }
    }
}

/// `{"isPlaceholder": true, "index": n}` with no other keys.
fn placeholder_index(map: &serde_json::Map<String, serde_json::Value>) -> Option<usize> {
    if map.len() != 2 || map.get(PLACEHOLDER_KEY) != Some(&serde_json::Value::Bool(true)) {
        return None;
    }
    map.get(INDEX_KEY)
        .and_then(serde_json::Value::as_u64)
        .and_then(|index| usize::try_from(index).ok())
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        convert(json, false)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl Serialize for Value {
    /// Binary leaves serialize as bytes, which JSON renders as a number array.
    /// The encoder replaces them with placeholders before serializing.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => items.serialize(serializer),
            Self::Object(map) => map.serialize(serializer),
            Self::Binary(bytes) => serializer.serialize_bytes(bytes),
            Self::Placeholder(index) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(PLACEHOLDER_KEY, &true)?;
                map.serialize_entry(INDEX_KEY, index)?;
                map.end()
            }
        }
    }
}
