//! Frame decoding and binary packet reconstruction.
//!
//! Text frames follow the grammar
//!
//! ```text
//! <type>[<attachments>-][/<nsp>,][<id>][<json>]
//! ```
//!
//! A binary packet that declares attachments is held back until that many
//! binary frames have arrived, then its placeholders are swapped for the
//! buffers and the completed packet is emitted.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard, mpsc};

use tracing::{debug, trace, warn};

use crate::binary;
use crate::config::ParserConfig;
use crate::error::{FramingError, ParserError, ParserResult, SequenceError};
use crate::frame::Frame;
use crate::packet::{Packet, PacketType};
use crate::validate;
use crate::value::Value;

type Listener = dyn Fn(&Packet) + Send + Sync;

/// A binary packet waiting for its attachments.
#[derive(Debug)]
struct Reconstruction {
    packet: Packet,
    expected: u64,
    buffers: Vec<Vec<u8>>,
}

impl Reconstruction {
    fn remaining(&self) -> u64 {
        self.expected.saturating_sub(self.buffers.len() as u64)
    }

    fn finish(self) -> ParserResult<Packet> {
        let Self {
            mut packet,
            buffers,
            ..
        } = self;
        if let Some(data) = packet.data.take() {
            packet.data = Some(binary::reconstruct(data, &buffers)?);
        }
        Ok(packet)
    }
}

#[derive(Debug, Default)]
enum DecoderState {
    #[default]
    Idle,
    Reconstructing(Reconstruction),
}

/// Stateful decoder fed one frame at a time, in arrival order.
///
/// Completed packets are handed to every subscriber, synchronously and in
/// registration order, before the ingest call returns. The ingest call also
/// returns the packet.
///
/// Subscribers run after the state lock is released, so a subscriber may
/// feed the decoder again. The flip side is that when two threads ingest
/// concurrently, subscribers can see their packets in a different order
/// than the state transitions happened. Callers that need emission order to
/// match arrival order must feed frames from a single thread.
///
/// Frames longer than [`ParserConfig::max_frame_size`] are rejected with
/// [`ParserError::FrameTooLarge`]. An oversized attachment also abandons
/// the packet it belonged to.
///
/// # Example
///
/// ```rust
/// use sioframe_parser::{Decoder, PacketType, Value};
///
/// let decoder = Decoder::new();
/// let rx = decoder.subscribe_channel();
///
/// assert!(decoder
///     .add_text(r#"51-["binary event",{"isPlaceholder":true,"index":0}]"#)
///     .unwrap()
///     .is_none());
/// let packet = decoder.add_binary(vec![1, 2, 3]).unwrap().unwrap();
///
/// assert_eq!(packet.packet_type, PacketType::BinaryEvent);
/// assert_eq!(
///     packet.data,
///     Some(Value::Array(vec![Value::from("binary event"), Value::binary(vec![1, 2, 3])]))
/// );
/// assert_eq!(rx.try_recv().unwrap(), packet);
/// ```
pub struct Decoder {
    config: ParserConfig,
    state: RwLock<DecoderState>,
    listeners: RwLock<Vec<Arc<Listener>>>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("config", &self.config)
            .field("pending_attachments", &self.pending_attachments())
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Creates a decoder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Creates a decoder with the given configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            state: RwLock::new(DecoderState::Idle),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Registers a callback invoked with every completed packet.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Packet) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Registers a channel receiving a copy of every completed packet.
    pub fn subscribe_channel(&self) -> mpsc::Receiver<Packet> {
        let (tx, rx) = mpsc::channel();
        self.subscribe(move |packet| {
            // A dropped receiver just stops listening.
            let _ = tx.send(packet.clone());
        });
        rx
    }

    /// Ingests one frame.
    pub fn add(&self, frame: Frame) -> ParserResult<Option<Packet>> {
        match frame {
            Frame::Text(text) => self.add_text(&text),
            Frame::Binary(bytes) => self.add_binary(bytes),
        }
    }

    /// Ingests a text frame.
    ///
    /// Returns the packet if it is complete, or `None` if it declared
    /// attachments that have yet to arrive.
    pub fn add_text(&self, text: &str) -> ParserResult<Option<Packet>> {
        let completed = {
            let mut state = self.write_state();
            if matches!(*state, DecoderState::Reconstructing(_)) {
                return Err(SequenceError::UnexpectedText.into());
            }
            self.config.check_frame_size(text.len())?;

            let packet = decode_text(text, &self.config).inspect_err(|err| {
                debug!(error = %err, "Failed to decode text frame");
            })?;

            match packet.attachments {
                Some(expected) if expected > 0 => {
                    debug!(
                        packet_type = %packet.packet_type,
                        nsp = %packet.nsp,
                        attachments = expected,
                        "Awaiting binary attachments"
                    );
                    *state = DecoderState::Reconstructing(Reconstruction {
                        packet,
                        expected,
                        buffers: Vec::new(),
                    });
                    None
                }
                _ => Some(packet),
            }
        };

        if let Some(packet) = &completed {
            self.emit(packet);
        }
        Ok(completed)
    }

    /// Ingests a binary frame.
    ///
    /// Returns the reconstructed packet once the last attachment arrives.
    pub fn add_binary(&self, bytes: Vec<u8>) -> ParserResult<Option<Packet>> {
        let completed = {
            let mut state = self.write_state();
            match std::mem::take(&mut *state) {
                DecoderState::Idle => return Err(SequenceError::UnexpectedBinary.into()),
                DecoderState::Reconstructing(mut reconstruction) => {
                    if let Err(err) = self.config.check_frame_size(bytes.len()) {
                        warn!(
                            packet_type = %reconstruction.packet.packet_type,
                            error = %err,
                            "Discarding packet with oversized attachment"
                        );
                        return Err(err);
                    }
                    reconstruction.buffers.push(bytes);
                    let remaining = reconstruction.remaining();
                    trace!(
                        received = reconstruction.buffers.len(),
                        remaining = remaining,
                        "Accepted binary attachment"
                    );
                    if remaining > 0 {
                        *state = DecoderState::Reconstructing(reconstruction);
                        return Ok(None);
                    }
                    reconstruction.finish().inspect_err(|err| {
                        warn!(error = %err, "Discarding packet that failed reconstruction");
                    })?
                }
            }
        };

        self.emit(&completed);
        Ok(Some(completed))
    }

    /// Abandons any pending reconstruction without emitting or failing.
    ///
    /// Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut state = self.write_state();
        if let DecoderState::Reconstructing(reconstruction) = std::mem::take(&mut *state) {
            debug!(
                packet_type = %reconstruction.packet.packet_type,
                remaining = reconstruction.remaining(),
                "Discarding pending reconstruction"
            );
        }
    }

    /// Whether a binary packet is waiting for attachments.
    ///
    /// The answer may be stale as soon as it is returned.
    pub fn is_reconstructing(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            DecoderState::Reconstructing(_)
        )
    }

    /// Number of attachments still expected, if reconstructing.
    pub fn pending_attachments(&self) -> Option<u64> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            DecoderState::Idle => None,
            DecoderState::Reconstructing(reconstruction) => Some(reconstruction.remaining()),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, DecoderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, packet: &Packet) {
        debug!(
            packet_type = %packet.packet_type,
            nsp = %packet.nsp,
            id = ?packet.id,
            attachments = ?packet.attachments,
            "Decoded packet"
        );
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(packet);
        }
    }
}

/// Parses a text frame into a packet.
///
/// Placeholders in binary packets are left in place; see [`Decoder`] for
/// reconstruction.
pub fn decode_text(text: &str, config: &ParserConfig) -> ParserResult<Packet> {
    let bytes = text.as_bytes();
    let (&digit, _) = bytes.split_first().ok_or(FramingError::EmptyFrame)?;
    let packet_type = PacketType::try_from(digit)?;
    let mut packet = Packet::new(packet_type);
    let mut pos = 1;

    if packet_type.is_binary() {
        let digits = digit_run(&bytes[pos..]);
        if digits == 0 || bytes.get(pos + digits) != Some(&b'-') {
            return Err(FramingError::IllegalAttachments.into());
        }
        let count: u64 = text[pos..pos + digits]
            .parse()
            .map_err(|_| FramingError::IllegalAttachments)?;
        if let Some(max) = config.max_attachments {
            if count > max {
                return Err(FramingError::TooManyAttachments { count, max }.into());
            }
        }
        packet.attachments = Some(count);
        pos += digits + 1;
    }

    if bytes.get(pos) == Some(&b'/') {
        match text[pos..].find(',') {
            Some(offset) => {
                packet.nsp = text[pos..pos + offset].to_string();
                pos += offset + 1;
            }
            None => {
                packet.nsp = text[pos..].to_string();
                pos = bytes.len();
            }
        }
    }

    let digits = digit_run(&bytes[pos..]);
    if digits > 0 {
        let id = text[pos..pos + digits]
            .parse()
            .map_err(|_| FramingError::IllegalId)?;
        packet.id = Some(id);
        pos += digits;
    }

    let rest = &text[pos..];
    if !rest.is_empty() {
        let json: serde_json::Value = serde_json::from_str(rest)
            .map_err(|err| FramingError::InvalidPayload(err.to_string()))?;
        let payload = if packet_type.is_binary() {
            Value::from_json_with_placeholders(json)
        } else {
            Value::from(json)
        };
        if !validate::is_valid(packet_type, Some(&payload)) {
            return Err(ParserError::Validation { packet_type });
        }
        packet.data = match payload {
            Value::Null => None,
            other => Some(other),
        };
    }

    Ok(packet)
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn decode(text: &str) -> ParserResult<Packet> {
        decode_text(text, &ParserConfig::default())
    }

    #[test]
    fn decodes_event() {
        let packet = decode(r#"2["chat message","hi"]"#).unwrap();
        assert_eq!(packet.packet_type, PacketType::Event);
        assert_eq!(packet.nsp, "/");
        assert_eq!(packet.id, None);
        assert_eq!(packet.attachments, None);
        assert_eq!(packet.data, Some(Value::from(json!(["chat message", "hi"]))));
    }

    #[test]
    fn rejects_reserved_event() {
        let err = decode(r#"2["connect",{}]"#).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Validation {
                packet_type: PacketType::Event
            }
        ));
    }

    #[test]
    fn decodes_connect_with_and_without_namespace() {
        let packet = decode(r#"0/admin,{"token":"abc"}"#).unwrap();
        assert_eq!(packet.packet_type, PacketType::Connect);
        assert_eq!(packet.nsp, "/admin");
        assert_eq!(packet.data, Some(Value::from(json!({"token": "abc"}))));

        let packet = decode(r#"0{"token":"abc"}"#).unwrap();
        assert_eq!(packet.nsp, "/");
        assert_eq!(packet.data, Some(Value::from(json!({"token": "abc"}))));
    }

    #[test]
    fn decodes_ack_with_namespace_and_id() {
        let packet = decode(r#"3/admin,12["ack-payload"]"#).unwrap();
        assert_eq!(packet.packet_type, PacketType::Ack);
        assert_eq!(packet.nsp, "/admin");
        assert_eq!(packet.id, Some(12));
        assert_eq!(packet.data, Some(Value::from(json!(["ack-payload"]))));
    }

    #[test]
    fn namespace_without_comma_consumes_rest() {
        let packet = decode("1/admin").unwrap();
        assert_eq!(packet.packet_type, PacketType::Disconnect);
        assert_eq!(packet.nsp, "/admin");
        assert_eq!(packet.data, None);

        let packet = decode(r#"2/chat12["x"]"#).unwrap();
        assert_eq!(packet.nsp, r#"/chat12["x"]"#);
        assert_eq!(packet.id, None);
        assert_eq!(packet.data, None);
    }

    #[test]
    fn id_without_payload() {
        let packet = decode("3/x,7").unwrap();
        assert_eq!(packet.id, Some(7));
        assert_eq!(packet.data, None);
    }

    #[test]
    fn disconnect_null_payload_is_absent() {
        let packet = decode("1null").unwrap();
        assert_eq!(packet.data, None);
        assert!(decode("1{}").is_err());
    }

    #[test]
    fn framing_errors() {
        let cases = [
            ("", FramingError::EmptyFrame),
            ("9", FramingError::UnknownType(b'9')),
            ("x[]", FramingError::UnknownType(b'x')),
            (r#"5["x"]"#, FramingError::IllegalAttachments),
            (r#"5-["x"]"#, FramingError::IllegalAttachments),
            ("51", FramingError::IllegalAttachments),
            (r#"6a1-[]"#, FramingError::IllegalAttachments),
            (r#"599999999999999999999-["x"]"#, FramingError::IllegalAttachments),
            (r#"399999999999999999999[]"#, FramingError::IllegalId),
        ];
        for (text, expected) in cases {
            match decode(text) {
                Err(ParserError::Framing(err)) => assert_eq!(err, expected, "frame {text:?}"),
                other => panic!("frame {text:?}: expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_json_is_framing_error() {
        let err = decode(r#"2["unterminated"#).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Framing(FramingError::InvalidPayload(_))
        ));
        let err = decode(r#"2["x"]garbage"#).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Framing(FramingError::InvalidPayload(_))
        ));
    }

    #[test]
    fn attachment_limit() {
        let config = ParserConfig::new().with_max_attachments(2);
        assert!(decode_text(r#"52-["x"]"#, &config).is_ok());
        let err = decode_text(r#"53-["x"]"#, &config).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Framing(FramingError::TooManyAttachments { count: 3, max: 2 })
        ));
    }

    #[test]
    fn placeholders_only_in_binary_packets() {
        let binary = decode(r#"51-["f",{"isPlaceholder":true,"index":0}]"#).unwrap();
        assert_eq!(
            binary.data,
            Some(Value::Array(vec![Value::from("f"), Value::Placeholder(0)]))
        );

        let plain = decode(r#"2["f",{"isPlaceholder":true,"index":0}]"#).unwrap();
        assert!(matches!(
            plain.data.as_ref().and_then(Value::as_array).map(|items| &items[1]),
            Some(Value::Object(_))
        ));
    }

    #[test]
    fn reconstructs_single_attachment() {
        let decoder = Decoder::new();
        let pending = decoder
            .add_text(r#"51-["binary event",{"isPlaceholder":true,"index":0}]"#)
            .unwrap();
        assert!(pending.is_none());
        assert!(decoder.is_reconstructing());
        assert_eq!(decoder.pending_attachments(), Some(1));

        let packet = decoder.add_binary(vec![7, 8, 9]).unwrap().unwrap();
        assert_eq!(packet.packet_type, PacketType::BinaryEvent);
        assert_eq!(packet.attachments, Some(1));
        assert_eq!(
            packet.data,
            Some(Value::Array(vec![
                Value::from("binary event"),
                Value::binary(vec![7, 8, 9])
            ]))
        );
        assert!(!decoder.is_reconstructing());
    }

    #[test]
    fn binary_with_zero_attachments_emits_immediately() {
        let decoder = Decoder::new();
        let packet = decoder.add_text(r#"60-1[]"#).unwrap().unwrap();
        assert_eq!(packet.packet_type, PacketType::BinaryAck);
        assert_eq!(packet.attachments, Some(0));
        assert_eq!(packet.id, Some(1));
        assert!(!decoder.is_reconstructing());
    }

    #[test]
    fn binary_while_idle_is_sequence_error() {
        let decoder = Decoder::new();
        let err = decoder.add_binary(vec![1]).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Sequence(SequenceError::UnexpectedBinary)
        ));
        assert!(!decoder.is_reconstructing());
    }

    #[test]
    fn text_while_reconstructing_keeps_pending_state() {
        let decoder = Decoder::new();
        decoder
            .add_text(r#"52-["pair",{"isPlaceholder":true,"index":0},{"isPlaceholder":true,"index":1}]"#)
            .unwrap();
        decoder.add_binary(vec![1]).unwrap();

        let err = decoder.add_text(r#"2["other"]"#).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Sequence(SequenceError::UnexpectedText)
        ));
        assert_eq!(decoder.pending_attachments(), Some(1));

        let packet = decoder.add_binary(vec![2]).unwrap().unwrap();
        assert_eq!(
            packet.data,
            Some(Value::Array(vec![
                Value::from("pair"),
                Value::binary(vec![1]),
                Value::binary(vec![2]),
            ]))
        );
    }

    #[test]
    fn out_of_range_placeholder_discards_packet() {
        let decoder = Decoder::new();
        let rx = decoder.subscribe_channel();
        decoder
            .add_text(r#"51-["x",{"isPlaceholder":true,"index":5}]"#)
            .unwrap();

        let err = decoder.add_binary(vec![0]).unwrap_err();
        assert!(matches!(
            err,
            ParserError::Reconstruction {
                index: 5,
                received: 1
            }
        ));
        assert!(!decoder.is_reconstructing());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn destroy_discards_silently_and_is_idempotent() {
        let decoder = Decoder::new();
        let rx = decoder.subscribe_channel();
        decoder
            .add_text(r#"53-["x",{"isPlaceholder":true,"index":0}]"#)
            .unwrap();
        decoder.add_binary(vec![1]).unwrap();

        decoder.destroy();
        decoder.destroy();
        assert!(!decoder.is_reconstructing());
        assert!(rx.try_recv().is_err());

        decoder
            .add_text(r#"51-["y",{"isPlaceholder":true,"index":0}]"#)
            .unwrap();
        assert_eq!(decoder.pending_attachments(), Some(1));
        let packet = decoder.add_binary(vec![9]).unwrap().unwrap();
        assert_eq!(packet.event_name(), Some("y"));
        assert_eq!(rx.try_recv().unwrap(), packet);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let decoder = Decoder::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            decoder.subscribe(move |packet| {
                seen.lock()
                    .unwrap()
                    .push(format!("{tag}:{}", packet.event_name().unwrap_or("")));
            });
        }

        decoder.add_text(r#"2["hello"]"#).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:hello", "second:hello", "third:hello"]
        );
    }

    #[test]
    fn listener_may_call_back_into_decoder() {
        let decoder = Arc::new(Decoder::new());
        let observed = Arc::new(Mutex::new(None));
        {
            let weak = Arc::downgrade(&decoder);
            let observed = Arc::clone(&observed);
            decoder.subscribe(move |_| {
                if let Some(decoder) = weak.upgrade() {
                    *observed.lock().unwrap() = Some(decoder.is_reconstructing());
                    decoder.destroy();
                }
            });
        }

        decoder.add_text(r#"2["ping"]"#).unwrap();
        assert_eq!(*observed.lock().unwrap(), Some(false));
    }

    #[test]
    fn decoder_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Decoder>();
    }

    #[test]
    fn oversized_text_frame_is_rejected() {
        let decoder = Decoder::with_config(ParserConfig::new().with_max_frame_size(16));

        let err = decoder
            .add_text(r#"2["this frame is far longer than sixteen bytes"]"#)
            .unwrap_err();
        assert!(matches!(err, ParserError::FrameTooLarge { max: 16, .. }));
        assert!(!decoder.is_reconstructing());

        assert!(decoder.add_text(r#"2["short"]"#).unwrap().is_some());
    }

    #[test]
    fn oversized_attachment_abandons_packet() {
        let decoder = Decoder::with_config(ParserConfig::new().with_max_frame_size(64));
        let rx = decoder.subscribe_channel();

        decoder
            .add_text(r#"51-["blob",{"isPlaceholder":true,"index":0}]"#)
            .unwrap();
        let err = decoder.add_binary(vec![0; 65]).unwrap_err();

        assert!(matches!(err, ParserError::FrameTooLarge { size: 65, max: 64 }));
        assert!(!decoder.is_reconstructing());
        assert!(rx.try_recv().is_err());
        assert!(decoder.add_text(r#"2["next"]"#).unwrap().is_some());
    }
}
