//! Length-prefixed frame transport over byte streams.
//!
//! Each frame is written as a kind byte and a 4-byte big-endian body length
//! followed by the body:
//!
//! ```text
//! +-----------+----------------+------------------+
//! | kind (1)  | length (4 BE)  |  body            |
//! +-----------+----------------+------------------+
//! ```
//!
//! Kind `0` is a text frame (UTF-8), kind `1` a binary frame.

use std::io::{Read, Write};

use crate::config::ParserConfig;
use crate::error::{ParserError, ParserResult};
use crate::frame::Frame;

/// Size of the kind byte plus the length prefix.
pub const FRAME_HEADER_SIZE: usize = 5;

const KIND_TEXT: u8 = 0;
const KIND_BINARY: u8 = 1;

/// Encodes a frame with its header.
///
/// # Example
///
/// ```rust
/// use sioframe_parser::{Frame, ParserConfig, decode_frame, encode_frame};
///
/// let config = ParserConfig::default();
/// let bytes = encode_frame(&Frame::Text("2[\"hi\"]".into()), &config).unwrap();
/// assert_eq!(bytes[0], 0);
/// assert_eq!(decode_frame(&bytes, &config).unwrap(), Frame::Text("2[\"hi\"]".into()));
/// ```
pub fn encode_frame(frame: &Frame, config: &ParserConfig) -> ParserResult<Vec<u8>> {
    let (kind, body) = match frame {
        Frame::Text(text) => (KIND_TEXT, text.as_bytes()),
        Frame::Binary(bytes) => (KIND_BINARY, bytes.as_slice()),
    };
    let len = config.check_frame_size(body.len())?;

    let mut buffer = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    buffer.push(kind);
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(body);
    Ok(buffer)
}

/// Decodes one frame from a buffer holding at least a complete frame.
pub fn decode_frame(data: &[u8], config: &ParserConfig) -> ParserResult<Frame> {
    if data.len() < FRAME_HEADER_SIZE {
        return Err(ParserError::IncompleteFrame {
            expected: FRAME_HEADER_SIZE,
            received: data.len(),
        });
    }

    let kind = data[0];
    let len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
    if len > config.max_frame_size {
        return Err(ParserError::FrameTooLarge {
            size: len,
            max: config.max_frame_size,
        });
    }

    let end = FRAME_HEADER_SIZE + len as usize;
    if data.len() < end {
        return Err(ParserError::IncompleteFrame {
            expected: end,
            received: data.len(),
        });
    }

    frame_from_body(kind, data[FRAME_HEADER_SIZE..end].to_vec())
}

fn frame_from_body(kind: u8, body: Vec<u8>) -> ParserResult<Frame> {
    match kind {
        KIND_TEXT => String::from_utf8(body)
            .map(Frame::Text)
            .map_err(|_| ParserError::InvalidUtf8),
        KIND_BINARY => Ok(Frame::Binary(body)),
        other => Err(ParserError::UnknownFrameKind(other)),
    }
}

/// Reads frames from a byte stream.
pub struct FrameReader<R> {
    reader: R,
    max_frame_size: u32,
}

impl<R: Read> FrameReader<R> {
    /// Creates a FrameReader with the default frame size limit.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &ParserConfig::default())
    }

    /// Creates a FrameReader using the limits from `config`.
    pub fn with_config(reader: R, config: &ParserConfig) -> Self {
        Self {
            reader,
            max_frame_size: config.max_frame_size,
        }
    }

    /// Reads a single frame.
    ///
    /// Returns `Ok(None)` if the stream ends cleanly between frames. A stream
    /// that ends inside a header or body fails with
    /// [`ParserError::IncompleteFrame`].
    pub fn read_frame(&mut self) -> ParserResult<Option<Frame>> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(ParserError::IncompleteFrame {
                        expected: FRAME_HEADER_SIZE,
                        received: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        if len > self.max_frame_size {
            return Err(ParserError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        // Grows with the data actually received, not the declared length.
        let mut body = Vec::new();
        (&mut self.reader)
            .take(u64::from(len))
            .read_to_end(&mut body)?;
        if body.len() < len as usize {
            return Err(ParserError::IncompleteFrame {
                expected: FRAME_HEADER_SIZE + len as usize,
                received: FRAME_HEADER_SIZE + body.len(),
            });
        }
        frame_from_body(header[0], body).map(Some)
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps this FrameReader, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = ParserResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Writes frames to a byte stream.
pub struct FrameWriter<W> {
    writer: W,
    config: ParserConfig,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a FrameWriter with the default frame size limit.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, &ParserConfig::default())
    }

    /// Creates a FrameWriter using the limits from `config`.
    pub fn with_config(writer: W, config: &ParserConfig) -> Self {
        Self {
            writer,
            config: config.clone(),
        }
    }

    /// Writes a single frame.
    pub fn write_frame(&mut self, frame: &Frame) -> ParserResult<()> {
        let data = encode_frame(frame, &self.config)?;
        self.writer.write_all(&data)?;
        Ok(())
    }

    /// Writes frames in order, e.g. the output of
    /// [`Encoder::encode`](crate::Encoder::encode).
    pub fn write_frames<'a>(&mut self, frames: impl IntoIterator<Item = &'a Frame>) -> ParserResult<()> {
        for frame in frames {
            self.write_frame(frame)?;
        }
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> ParserResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwraps this FrameWriter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
