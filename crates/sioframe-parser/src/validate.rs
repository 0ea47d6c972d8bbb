//! Payload shape rules per packet type.

use crate::packet::PacketType;
use crate::value::Value;

/// Event names with a special meaning that applications may not emit.
pub const RESERVED_EVENTS: [&str; 4] = ["connect", "connect_error", "disconnect", "disconnecting"];

/// Returns true if `name` is a reserved event name.
pub fn is_reserved_event(name: &str) -> bool {
    RESERVED_EVENTS.contains(&name)
}

/// Checks a payload against the shape its packet type requires.
///
/// `None` means the frame carried no payload. A JSON `null` is treated as
/// absent for DISCONNECT only.
pub fn is_valid(packet_type: PacketType, payload: Option<&Value>) -> bool {
    match packet_type {
        PacketType::Connect => matches!(payload, None | Some(Value::Object(_))),
        PacketType::Disconnect => matches!(payload, None | Some(Value::Null)),
        PacketType::ConnectError => {
            matches!(payload, Some(Value::Object(_) | Value::String(_)))
        }
        PacketType::Event | PacketType::BinaryEvent => match payload {
            Some(Value::Array(items)) => match items.first() {
                Some(Value::String(name)) => !is_reserved_event(name),
                _ => false,
            },
            _ => false,
        },
        PacketType::Ack | PacketType::BinaryAck => matches!(payload, Some(Value::Array(_))),
    }
}
