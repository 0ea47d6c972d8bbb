//! Parser error types.

use thiserror::Error;

use crate::packet::PacketType;

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

/// Errors that can occur while encoding, decoding or streaming packets.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The text frame does not follow the packet grammar.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The payload is well-formed JSON but has the wrong shape for its type.
    #[error("invalid payload for {packet_type} packet")]
    Validation { packet_type: PacketType },

    /// A frame arrived that the decoder is not expecting in its current state.
    #[error("protocol sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// A placeholder points past the attachments that were received.
    #[error("placeholder index {index} out of range ({received} attachments received)")]
    Reconstruction { index: usize, received: usize },

    /// Binary leaves found in a packet type that has no binary variant.
    #[error("{packet_type} packets cannot carry binary data")]
    BinaryNotAllowed { packet_type: PacketType },

    /// A non-default namespace that does not start with `/`.
    #[error("namespace {0:?} must start with '/'")]
    InvalidNamespace(String),

    /// Failed to serialize the payload to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while reading or writing a frame stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream frame exceeds the configured maximum size.
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: u32, max: u32 },

    /// Stream frame is cut short.
    #[error("incomplete frame: expected {expected} bytes, got {received}")]
    IncompleteFrame { expected: usize, received: usize },

    /// Stream frame header carries an unknown kind byte.
    #[error("unknown frame kind: {0}")]
    UnknownFrameKind(u8),

    /// Text frame body is not valid UTF-8.
    #[error("text frame is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors raised while parsing the text frame grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// Nothing to parse.
    #[error("empty frame")]
    EmptyFrame,

    /// The first byte is not a known packet type digit.
    #[error("unknown packet type {0:?}")]
    UnknownType(u8),

    /// The `<count>-` prefix of a binary packet is missing or malformed.
    #[error("illegal attachments")]
    IllegalAttachments,

    /// The declared attachment count exceeds the configured limit.
    #[error("too many attachments: {count} (max: {max})")]
    TooManyAttachments { count: u64, max: u64 },

    /// The ack id does not fit in 64 bits.
    #[error("illegal id")]
    IllegalId,

    /// The payload is not valid JSON.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Errors raised when a frame does not match the decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A text frame arrived while attachments are still pending.
    #[error("got plaintext data while reconstructing a packet")]
    UnexpectedText,

    /// A binary frame arrived with no reconstruction pending.
    #[error("got binary data with no reconstruction pending")]
    UnexpectedBinary,
}

/// Coarse classification of a [`ParserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Framing,
    Validation,
    Sequence,
    Reconstruction,
    Encode,
    Transport,
}

impl ParserError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Framing(_) => ErrorKind::Framing,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Sequence(_) => ErrorKind::Sequence,
            Self::Reconstruction { .. } => ErrorKind::Reconstruction,
            Self::BinaryNotAllowed { .. } | Self::InvalidNamespace(_) | Self::Serialization(_) => {
                ErrorKind::Encode
            }
            Self::Io(_)
            | Self::FrameTooLarge { .. }
            | Self::IncompleteFrame { .. }
            | Self::UnknownFrameKind(_)
            | Self::InvalidUtf8 => ErrorKind::Transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_error_display() {
        let err = ParserError::from(FramingError::UnknownType(b'9'));
        assert!(err.to_string().contains("unknown packet type"));
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn validation_error_names_packet_type() {
        let err = ParserError::Validation {
            packet_type: PacketType::Event,
        };
        assert_eq!(err.to_string(), "invalid payload for EVENT packet");
    }

    #[test]
    fn reconstruction_error_display() {
        let err = ParserError::Reconstruction {
            index: 3,
            received: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 3"));
        assert!(msg.contains("2 attachments"));
        assert_eq!(err.kind(), ErrorKind::Reconstruction);
    }

    #[test]
    fn sequence_error_kind() {
        let err = ParserError::from(SequenceError::UnexpectedBinary);
        assert_eq!(err.kind(), ErrorKind::Sequence);
        assert!(err.to_string().contains("no reconstruction pending"));
    }
}
