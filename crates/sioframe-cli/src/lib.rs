//! Command-line encoder/decoder for sioframe packets
//!
//! This crate provides the `sioframe` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod tracing;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
