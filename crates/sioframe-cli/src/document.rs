//! Line-oriented text formats used on stdin/stdout.
//!
//! Packets are written as one JSON document per line. Binary leaves, which
//! JSON cannot express, appear as `{"$binary": "<base64>"}`:
//!
//! ```text
//! {"type":"EVENT","nsp":"/","data":["upload",{"$binary":"AQID"}]}
//! ```
//!
//! Frames are one per line: text frames verbatim, binary frames as
//! `b64:<base64>`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sioframe_parser::{DEFAULT_NAMESPACE, Frame, INDEX_KEY, PLACEHOLDER_KEY, Packet, PacketType, Value};

use crate::error::CliResult;

/// Object key tagging a base64-encoded binary leaf.
pub const BINARY_KEY: &str = "$binary";

/// Line prefix of a binary frame.
pub const BINARY_LINE_PREFIX: &str = "b64:";

/// JSON form of a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketDocument {
    /// Packet type name, e.g. `EVENT`.
    #[serde(rename = "type")]
    pub packet_type: PacketType,

    /// Namespace.
    #[serde(default = "default_nsp")]
    pub nsp: String,

    /// Ack id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Attachment count (output only; recomputed when encoding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<u64>,

    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

fn default_nsp() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl PacketDocument {
    /// Builds the document for a decoded packet.
    pub fn from_packet(packet: &Packet) -> Self {
        Self {
            packet_type: packet.packet_type,
            nsp: packet.nsp.clone(),
            id: packet.id,
            attachments: packet.attachments,
            data: packet.data.as_ref().map(value_to_json),
        }
    }

    /// Converts the document into a packet ready for encoding.
    pub fn into_packet(self) -> CliResult<Packet> {
        let data = self.data.map(value_from_json).transpose()?;
        Ok(Packet {
            packet_type: self.packet_type,
            nsp: self.nsp,
            data,
            id: self.id,
            attachments: self.attachments,
        })
    }
}

/// Converts a payload value to JSON, tagging binary leaves.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Object(map) => Json::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), value_to_json(item)))
                .collect(),
        ),
        Value::Binary(bytes) => {
            let mut map = serde_json::Map::new();
            map.insert(BINARY_KEY.to_string(), Json::String(STANDARD.encode(bytes)));
            Json::Object(map)
        }
        Value::Placeholder(index) => {
            let mut map = serde_json::Map::new();
            map.insert(PLACEHOLDER_KEY.to_string(), Json::Bool(true));
            map.insert(INDEX_KEY.to_string(), Json::from(*index));
            Json::Object(map)
        }
    }
}

/// Converts JSON to a payload value, decoding tagged binary leaves.
pub fn value_from_json(json: serde_json::Value) -> CliResult<Value> {
    use serde_json::Value as Json;

    Ok(match json {
        Json::Array(items) => Value::Array(
            items
                .into_iter()
                .map(value_from_json)
                .collect::<CliResult<_>>()?,
        ),
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(Json::String(encoded)) = map.get(BINARY_KEY) {
                    return Ok(Value::Binary(STANDARD.decode(encoded)?));
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, item)| Ok((key, value_from_json(item)?)))
                    .collect::<CliResult<_>>()?,
            )
        }
        scalar => Value::from(scalar),
    })
}

/// Renders a frame as one line.
pub fn frame_to_line(frame: &Frame) -> String {
    match frame {
        Frame::Text(text) => text.clone(),
        Frame::Binary(bytes) => format!("{BINARY_LINE_PREFIX}{}", STANDARD.encode(bytes)),
    }
}

/// Parses one frame line.
pub fn frame_from_line(line: &str) -> CliResult<Frame> {
    match line.strip_prefix(BINARY_LINE_PREFIX) {
        Some(encoded) => Ok(Frame::Binary(STANDARD.decode(encoded.trim())?)),
        None => Ok(Frame::Text(line.to_string())),
    }
}
