//! sioframe CLI entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use sioframe_cli::cli::{Cli, Command};
use sioframe_cli::commands::{self, open_input};
use sioframe_cli::config::CliConfig;
use sioframe_cli::error::CliResult;
use sioframe_cli::tracing::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => CliConfig::load_from(path)?,
        None => CliConfig::default(),
    };

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        config.tracing_config()?
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format.into());
    }
    init_tracing(tracing_config)?;

    let mut parser_config = config.parser_config();
    if let Some(max) = cli.max_attachments {
        parser_config = parser_config.with_max_attachments(max);
    }

    let stdout = io::stdout().lock();
    let summary = match cli.command {
        Command::Encode { input, format } => {
            commands::encode::run(open_input(input.as_deref())?, stdout, format, &parser_config)?
        }
        Command::Decode { input, format } => {
            commands::decode::run(open_input(input.as_deref())?, stdout, format, &parser_config)?
        }
    };

    summary.into_result()
}
