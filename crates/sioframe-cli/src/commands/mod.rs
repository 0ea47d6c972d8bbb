//! Subcommand implementations.
//!
//! Each command reads from a `BufRead` and writes to a `Write`, so they can
//! be driven from stdin/stdout or from buffers in tests.

pub mod decode;
pub mod encode;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{CliError, CliResult};

/// How frames are laid out on the frame side of a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FrameFormat {
    /// One frame per line: text frames verbatim, binary frames as `b64:...`
    #[default]
    Lines,
    /// Length-prefixed binary stream
    Stream,
}

/// Counts for one command run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Packet documents or frames read.
    pub processed: usize,
    /// Items that failed.
    pub failed: usize,
}

impl Summary {
    /// Fails if any line failed.
    pub fn into_result(self) -> CliResult<()> {
        if self.failed == 0 {
            Ok(())
        } else {
            Err(CliError::Failed {
                failed: self.failed,
                total: self.processed,
            })
        }
    }
}

/// Opens the input file, or stdin when no path is given.
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match path {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}
