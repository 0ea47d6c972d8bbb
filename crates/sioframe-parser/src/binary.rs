//! Binary attachment extraction and reinsertion.
//!
//! Both directions go through [`walk`], so the order in which leaves are
//! visited is defined once. Arrays are visited front to back and objects in
//! key order.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::error::{ParserError, ParserResult};
use crate::value::Value;

/// Rebuilds `value` depth-first, passing every non-container node to `leaf`.
fn walk<E, F>(value: Value, leaf: &mut F) -> Result<Value, E>
where
    F: FnMut(Value) -> Result<Value, E>,
{
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| walk(item, leaf))
            .collect::<Result<Vec<_>, E>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| walk(item, leaf).map(|item| (key, item)))
            .collect::<Result<BTreeMap<_, _>, E>>()
            .map(Value::Object),
        other => leaf(other),
    }
}

/// Replaces every binary leaf with a placeholder.
///
/// Returns the rewritten tree and the extracted buffers; the buffer at
/// position `n` is the one referenced by `Placeholder(n)`.
pub fn deconstruct(value: Value) -> (Value, Vec<Vec<u8>>) {
    let mut buffers = Vec::new();
    let result = walk(value, &mut |leaf| {
        Ok::<_, Infallible>(match leaf {
            Value::Binary(bytes) => {
                buffers.push(bytes);
                Value::Placeholder(buffers.len() - 1)
            }
            other => other,
        })
    });
    let value = match result {
        Ok(value) => value,
        Err(never) => match never {},
    };
    (value, buffers)
}

/// Replaces every placeholder with the buffer it indexes.
pub fn reconstruct(value: Value, buffers: &[Vec<u8>]) -> ParserResult<Value> {
    walk(value, &mut |leaf| match leaf {
        Value::Placeholder(index) => buffers
            .get(index)
            .cloned()
            .map(Value::Binary)
            .ok_or(ParserError::Reconstruction {
                index,
                received: buffers.len(),
            }),
        other => Ok(other),
    })
}
