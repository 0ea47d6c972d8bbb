//! Socket.IO packet codec with binary attachment support.
//!
//! # Packet Overview
//!
//! A packet travels as one text frame, optionally followed by binary frames:
//!
//! ```text
//! <type>[<attachments>-][<nsp>,][<id>][<json>]
//! ```
//!
//! | Digit | Type |
//! |---|---|
//! | 0 | CONNECT |
//! | 1 | DISCONNECT |
//! | 2 | EVENT |
//! | 3 | ACK |
//! | 4 | CONNECT_ERROR |
//! | 5 | BINARY_EVENT |
//! | 6 | BINARY_ACK |
//!
//! Binary values inside the payload are replaced by
//! `{"isPlaceholder":true,"index":n}` and sent as the n-th binary frame after
//! the text frame.
//!
//! # Example
//!
//! ```rust
//! use sioframe_parser::{Decoder, Encoder, Packet, PacketType, Value};
//!
//! let packet = Packet::event("upload", [Value::binary(vec![1, 2, 3])]).with_nsp("/files");
//! let frames = Encoder::new().encode(&packet).unwrap();
//!
//! let decoder = Decoder::new();
//! let mut decoded = None;
//! for frame in frames {
//!     decoded = decoder.add(frame).unwrap();
//! }
//!
//! let decoded = decoded.unwrap();
//! assert_eq!(decoded.packet_type, PacketType::BinaryEvent);
//! assert_eq!(decoded.nsp, "/files");
//! assert_eq!(decoded.data, packet.data);
//! ```

mod binary;
mod config;
mod decoder;
mod encoder;
mod error;
mod frame;
mod packet;
mod stream;
mod validate;
mod value;

pub use binary::{deconstruct, reconstruct};
pub use config::{DEFAULT_MAX_FRAME_SIZE, ParserConfig};
pub use decoder::{Decoder, decode_text};
pub use encoder::{EncodedPacket, Encoder, encode_text};
pub use error::{ErrorKind, FramingError, ParserError, ParserResult, SequenceError};
pub use frame::Frame;
pub use packet::{DEFAULT_NAMESPACE, Packet, PacketType};
pub use stream::{FRAME_HEADER_SIZE, FrameReader, FrameWriter, decode_frame, encode_frame};
pub use validate::{RESERVED_EVENTS, is_reserved_event, is_valid};
pub use value::{INDEX_KEY, PLACEHOLDER_KEY, Value};

/// Socket.IO protocol revision implemented by this crate.
pub const PROTOCOL_REVISION: u8 = 5;
