//! Packet encoding.
//!
//! A packet becomes one text frame followed by one binary frame per
//! attachment:
//!
//! ```text
//! <type>[<attachments>-][<nsp>,][<id>][<json>]   then   <bytes> ...
//! ```

use tracing::debug;

use crate::binary;
use crate::error::{ParserError, ParserResult};
use crate::frame::Frame;
use crate::packet::{DEFAULT_NAMESPACE, Packet};

/// Output of [`Encoder::encode_packet`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPacket {
    /// The packet as sent: promoted to a binary type if it carried binary
    /// data, with placeholders in place of the extracted buffers.
    pub packet: Packet,
    /// The text frame.
    pub text: String,
    /// Extracted buffers, in placeholder index order.
    pub attachments: Vec<Vec<u8>>,
}

impl EncodedPacket {
    /// Returns the frames in transmission order.
    pub fn into_frames(self) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(1 + self.attachments.len());
        frames.push(Frame::Text(self.text));
        frames.extend(self.attachments.into_iter().map(Frame::Binary));
        frames
    }
}

/// Stateless packet encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder;

impl Encoder {
    /// Creates an encoder.
    pub fn new() -> Self {
        Self
    }

    /// Encodes a packet into its text frame and attachment frames.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sioframe_parser::{Encoder, Frame, Packet, Value};
    ///
    /// let packet = Packet::event("upload", [Value::binary(vec![1, 2, 3])]);
    /// let frames = Encoder::new().encode(&packet).unwrap();
    /// assert_eq!(
    ///     frames,
    ///     vec![
    ///         Frame::Text(r#"51-["upload",{"isPlaceholder":true,"index":0}]"#.to_string()),
    ///         Frame::Binary(vec![1, 2, 3]),
    ///     ]
    /// );
    /// ```
    pub fn encode(&self, packet: &Packet) -> ParserResult<Vec<Frame>> {
        self.encode_packet(packet.clone())
            .map(EncodedPacket::into_frames)
    }

    /// Encodes a packet, keeping the rewritten packet and its parts apart.
    pub fn encode_packet(&self, mut packet: Packet) -> ParserResult<EncodedPacket> {
        let has_binary = packet.data.as_ref().is_some_and(|data| data.has_binary());
        let mut attachments = Vec::new();

        if has_binary || packet.packet_type.is_binary() {
            let binary_type =
                packet
                    .packet_type
                    .to_binary()
                    .ok_or(ParserError::BinaryNotAllowed {
                        packet_type: packet.packet_type,
                    })?;
            if let Some(data) = packet.data.take() {
                let (data, extracted) = binary::deconstruct(data);
                packet.data = Some(data);
                attachments = extracted;
            }
            packet.packet_type = binary_type;
            packet.attachments = Some(attachments.len() as u64);
        } else {
            packet.attachments = None;
        }

        let text = encode_text(&packet)?;
        debug!(
            packet_type = %packet.packet_type,
            nsp = %packet.nsp,
            id = ?packet.id,
            attachments = attachments.len(),
            "Encoded packet"
        );

        Ok(EncodedPacket {
            packet,
            text,
            attachments,
        })
    }
}

/// Writes the text frame for a packet whose payload is already free of
/// binary leaves.
///
/// Fails with [`ParserError::InvalidNamespace`] if a namespace other than
/// the default one does not start with `/`, since the frame could not be
/// read back.
pub fn encode_text(packet: &Packet) -> ParserResult<String> {
    let mut text = String::new();
    text.push(packet.packet_type.as_char());

    if packet.packet_type.is_binary() {
        text.push_str(&packet.attachments.unwrap_or(0).to_string());
        text.push('-');
    }

    if !packet.nsp.is_empty() && packet.nsp != DEFAULT_NAMESPACE {
        if !packet.nsp.starts_with('/') {
            return Err(ParserError::InvalidNamespace(packet.nsp.clone()));
        }
        text.push_str(&packet.nsp);
        text.push(',');
    }

    if let Some(id) = packet.id {
        text.push_str(&id.to_string());
    }

    if let Some(data) = &packet.data {
        text.push_str(&serde_json::to_string(data)?);
    }

    Ok(text)
}
