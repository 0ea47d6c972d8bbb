//! Packet model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FramingError;
use crate::value::Value;

/// Default namespace when none is given on the wire.
pub const DEFAULT_NAMESPACE: &str = "/";

/// The seven packet kinds, keyed by their wire digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketType {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl PacketType {
    /// Returns the wire digit for this type.
    pub fn as_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
            Self::BinaryEvent => '5',
            Self::BinaryAck => '6',
        }
    }

    /// Whether packets of this type carry an attachment count.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::BinaryEvent | Self::BinaryAck)
    }

    /// Returns the binary variant of this type, if it has one.
    ///
    /// Binary types map to themselves.
    pub fn to_binary(self) -> Option<Self> {
        match self {
            Self::Event | Self::BinaryEvent => Some(Self::BinaryEvent),
            Self::Ack | Self::BinaryAck => Some(Self::BinaryAck),
            Self::Connect | Self::Disconnect | Self::ConnectError => None,
        }
    }

    /// Returns the upper snake case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Event => "EVENT",
            Self::Ack => "ACK",
            Self::ConnectError => "CONNECT_ERROR",
            Self::BinaryEvent => "BINARY_EVENT",
            Self::BinaryAck => "BINARY_ACK",
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = FramingError;

    fn try_from(digit: u8) -> Result<Self, Self::Error> {
        match digit {
            b'0' => Ok(Self::Connect),
            b'1' => Ok(Self::Disconnect),
            b'2' => Ok(Self::Event),
            b'3' => Ok(Self::Ack),
            b'4' => Ok(Self::ConnectError),
            b'5' => Ok(Self::BinaryEvent),
            b'6' => Ok(Self::BinaryAck),
            other => Err(FramingError::UnknownType(other)),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single protocol packet.
///
/// `attachments` is only meaningful for binary types. The decoder always sets
/// it for them, and the encoder recomputes it from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Packet kind.
    pub packet_type: PacketType,
    /// Namespace, `"/"` by default.
    pub nsp: String,
    /// Payload.
    pub data: Option<Value>,
    /// Ack correlation id.
    pub id: Option<u64>,
    /// Number of binary attachments following the text frame.
    pub attachments: Option<u64>,
}

impl Packet {
    /// Creates a packet of the given type on the default namespace.
    pub fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            nsp: DEFAULT_NAMESPACE.to_string(),
            data: None,
            id: None,
            attachments: None,
        }
    }

    /// Creates a CONNECT packet.
    pub fn connect(data: Option<Value>) -> Self {
        Self {
            data,
            ..Self::new(PacketType::Connect)
        }
    }

    /// Creates a DISCONNECT packet.
    pub fn disconnect() -> Self {
        Self::new(PacketType::Disconnect)
    }

    /// Creates an EVENT packet named `event` with the given arguments.
    pub fn event(event: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        let mut items = vec![Value::String(event.into())];
        items.extend(args);
        Self {
            data: Some(Value::Array(items)),
            ..Self::new(PacketType::Event)
        }
    }

    /// Creates an ACK packet for `id`.
    pub fn ack(id: u64, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            data: Some(Value::Array(args.into_iter().collect())),
            id: Some(id),
            ..Self::new(PacketType::Ack)
        }
    }

    /// Creates a CONNECT_ERROR packet.
    pub fn connect_error(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(PacketType::ConnectError)
        }
    }

    /// Builder: set the namespace.
    pub fn with_nsp(mut self, nsp: impl Into<String>) -> Self {
        self.nsp = nsp.into();
        self
    }

    /// Builder: set the ack id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder: set the payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the event name for EVENT packets.
    pub fn event_name(&self) -> Option<&str> {
        if !matches!(
            self.packet_type,
            PacketType::Event | PacketType::BinaryEvent
        ) {
            return None;
        }
        match &self.data {
            Some(Value::Array(items)) => match items.first() {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}
