//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::FrameFormat;
use crate::config::LogFormat;

/// sioframe - encode and decode Socket.IO packet frames
#[derive(Debug, Parser)]
#[command(name = "sioframe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SIOFRAME_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Maximum attachments a binary packet may declare
    #[arg(long, env = "SIOFRAME_MAX_ATTACHMENTS", global = true)]
    pub max_attachments: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode packet documents (one JSON object per line) into frames
    Encode {
        /// Read from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Frame output format
        #[arg(long, short, value_enum, default_value_t = FrameFormat::Lines)]
        format: FrameFormat,
    },

    /// Decode frames into packet documents
    Decode {
        /// Read from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Frame input format
        #[arg(long, short, value_enum, default_value_t = FrameFormat::Lines)]
        format: FrameFormat,
    },
}
