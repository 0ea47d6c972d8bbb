//! `sioframe decode`: frames in, packet documents out.

use std::io::{BufRead, Write};

use sioframe_parser::{Decoder, Frame, FrameReader, ParserConfig};
use tracing::{debug, warn};

use super::{FrameFormat, Summary};
use crate::document::{PacketDocument, frame_from_line};
use crate::error::CliResult;

/// Feeds every frame of `input` through one decoder and writes each
/// completed packet.
///
/// A frame that fails is logged and skipped. In stream format a broken
/// stream cannot be resynchronized, so a stream error ends the run. A binary
/// packet still waiting for attachments at the end of input is discarded and
/// counted as failed.
pub fn run<R: BufRead, W: Write>(
    input: R,
    output: W,
    format: FrameFormat,
    config: &ParserConfig,
) -> CliResult<Summary> {
    let mut session = Session::new(output, config);

    match format {
        FrameFormat::Lines => {
            for (index, line) in input.lines().enumerate() {
                let line = line?;
                // `lines` leaves a trailing `\r` behind; any other
                // whitespace belongs to the frame.
                let line = line.strip_suffix('\r').unwrap_or(&line);
                if line.trim().is_empty() {
                    continue;
                }
                session.feed(index + 1, frame_from_line(line))?;
            }
        }
        FrameFormat::Stream => {
            for (index, frame) in FrameReader::with_config(input, config).enumerate() {
                session.feed(index + 1, Ok(frame?))?;
            }
        }
    }

    session.finish()
}

struct Session<W> {
    decoder: Decoder,
    output: W,
    summary: Summary,
}

impl<W: Write> Session<W> {
    fn new(output: W, config: &ParserConfig) -> Self {
        Self {
            decoder: Decoder::with_config(config.clone()),
            output,
            summary: Summary::default(),
        }
    }

    fn feed(&mut self, position: usize, frame: CliResult<Frame>) -> CliResult<()> {
        self.summary.processed += 1;

        let decoded = frame.and_then(|frame| Ok(self.decoder.add(frame)?));
        match decoded {
            Ok(Some(packet)) => {
                let document = PacketDocument::from_packet(&packet);
                writeln!(self.output, "{}", serde_json::to_string(&document)?)?;
            }
            Ok(None) => {
                debug!(
                    position,
                    pending = ?self.decoder.pending_attachments(),
                    "Waiting for attachments"
                );
            }
            Err(err) => {
                warn!(position, error = %err, "Failed to decode frame");
                self.summary.failed += 1;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> CliResult<Summary> {
        if let Some(remaining) = self.decoder.pending_attachments() {
            warn!(remaining, "Input ended before all attachments arrived");
            self.decoder.destroy();
            self.summary.failed += 1;
        }

        self.output.flush()?;
        Ok(self.summary)
    }
}
