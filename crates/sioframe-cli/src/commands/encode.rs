//! `sioframe encode`: packet documents in, frames out.

use std::io::{BufRead, Write};

use sioframe_parser::{Encoder, Frame, FrameWriter, ParserConfig};
use tracing::{debug, warn};

use super::{FrameFormat, Summary};
use crate::document::{PacketDocument, frame_to_line};
use crate::error::CliResult;

enum FrameSink<W: Write> {
    Lines(W),
    Stream(FrameWriter<W>),
}

impl<W: Write> FrameSink<W> {
    fn new(output: W, format: FrameFormat, config: &ParserConfig) -> Self {
        match format {
            FrameFormat::Lines => Self::Lines(output),
            FrameFormat::Stream => Self::Stream(FrameWriter::with_config(output, config)),
        }
    }

    fn write(&mut self, frames: &[Frame]) -> CliResult<()> {
        match self {
            Self::Lines(output) => {
                for frame in frames {
                    writeln!(output, "{}", frame_to_line(frame))?;
                }
            }
            Self::Stream(writer) => writer.write_frames(frames)?,
        }
        Ok(())
    }

    fn flush(&mut self) -> CliResult<()> {
        match self {
            Self::Lines(output) => output.flush()?,
            Self::Stream(writer) => writer.flush()?,
        }
        Ok(())
    }
}

/// Encodes every packet document line of `input`.
///
/// A line that fails, including one that would produce a frame longer than
/// `config.max_frame_size`, is logged and skipped.
pub fn run<R: BufRead, W: Write>(
    input: R,
    output: W,
    format: FrameFormat,
    config: &ParserConfig,
) -> CliResult<Summary> {
    let encoder = Encoder::new();
    let mut sink = FrameSink::new(output, format, config);
    let mut summary = Summary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.processed += 1;

        match encode_line(&encoder, line, config) {
            Ok(frames) => {
                debug!(line = index + 1, frames = frames.len(), "Encoded packet");
                sink.write(&frames)?;
            }
            Err(err) => {
                warn!(line = index + 1, error = %err, "Failed to encode packet");
                summary.failed += 1;
            }
        }
    }

    sink.flush()?;
    Ok(summary)
}

fn encode_line(encoder: &Encoder, line: &str, config: &ParserConfig) -> CliResult<Vec<Frame>> {
    let document: PacketDocument = serde_json::from_str(line)?;
    let frames = encoder.encode(&document.into_packet()?)?;
    // Checked up front so a packet is written whole or not at all.
    for frame in &frames {
        config.check_frame_size(frame.len())?;
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sioframe_parser::FrameReader;

    fn encode(input: &str) -> (String, Summary) {
        let mut output = Vec::new();
        let summary = run(
            input.as_bytes(),
            &mut output,
            FrameFormat::Lines,
            &ParserConfig::default(),
        )
        .unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn encodes_plain_and_binary_packets() {
        let input = concat!(
            r#"{"type":"EVENT","data":["chat message","hi"]}"#,
            "\n\n",
            r#"{"type":"EVENT","nsp":"/files","id":2,"data":["upload",{"$binary":"AQID"}]}"#,
            "\n",
        );

        let (output, summary) = encode(input);

        assert_eq!(
            summary,
            Summary {
                processed: 2,
                failed: 0
            }
        );
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"2["chat message","hi"]"#,
                r#"51-/files,2["upload",{"isPlaceholder":true,"index":0}]"#,
                "b64:AQID",
            ]
        );
    }

    #[test]
    fn bad_lines_are_counted_and_skipped() {
        let input = concat!(
            "not json\n",
            r#"{"type":"CONNECT","data":{"$binary":"AA=="}}"#,
            "\n",
            r#"{"type":"CONNECT","nsp":"admin"}"#,
            "\n",
            r#"{"type":"DISCONNECT"}"#,
            "\n",
        );

        let (output, summary) = encode(input);

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed, 3);
        assert_eq!(output, "1\n");
    }

    #[test]
    fn stream_output_is_length_prefixed() {
        let input = r#"{"type":"EVENT","data":["upload",{"$binary":"AQID"}]}"#;
        let config = ParserConfig::default();

        let mut output = Vec::new();
        let summary = run(input.as_bytes(), &mut output, FrameFormat::Stream, &config).unwrap();
        assert_eq!(summary.failed, 0);

        let frames = FrameReader::with_config(output.as_slice(), &config)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            frames,
            vec![
                Frame::Text(r#"51-["upload",{"isPlaceholder":true,"index":0}]"#.to_string()),
                Frame::Binary(vec![1, 2, 3]),
            ]
        );
    }

    #[test]
    fn oversized_packet_is_skipped_whole() {
        let input = concat!(
            r#"{"type":"EVENT","data":["x",{"$binary":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"}]}"#,
            "\n",
            r#"{"type":"EVENT","data":["y"]}"#,
            "\n",
        );
        let config = ParserConfig::new().with_max_frame_size(16);

        let mut output = Vec::new();
        let summary = run(input.as_bytes(), &mut output, FrameFormat::Lines, &config).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(String::from_utf8(output).unwrap(), "2[\"y\"]\n");
    }
}
