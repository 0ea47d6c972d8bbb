//! CLI configuration.
//!
//! Settings are read from an optional TOML file:
//!
//! ```toml
//! [parser]
//! max_attachments = 16
//! max_frame_size = 1048576
//!
//! [logging]
//! format = "json"
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sioframe_parser::{DEFAULT_MAX_FRAME_SIZE, ParserConfig};
use tracing::Level;

use crate::error::{CliError, CliResult};
use crate::tracing::{TracingConfig, TracingOutputFormat};

/// Configuration for the sioframe CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Parser limits.
    pub parser: ParserSettings,

    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Parser limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Maximum attachments a binary packet may declare.
    pub max_attachments: Option<u64>,

    /// Maximum frame body size in bytes.
    pub max_frame_size: u32,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_attachments: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,

    /// Default level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> CliResult<Self> {
        toml::from_str(content).map_err(|e| CliError::config(format!("failed to parse config: {}", e)))
    }

    /// Returns the parser configuration.
    pub fn parser_config(&self) -> ParserConfig {
        let config = ParserConfig::new().with_max_frame_size(self.parser.max_frame_size);
        match self.parser.max_attachments {
            Some(max) => config.with_max_attachments(max),
            None => config,
        }
    }

    /// Returns the tracing configuration for the configured level and format.
    pub fn tracing_config(&self) -> CliResult<TracingConfig> {
        let level: Level = self
            .logging
            .level
            .parse()
            .map_err(|_| CliError::config(format!("invalid log level: {}", self.logging.level)))?;
        Ok(TracingConfig::default()
            .with_level(level)
            .with_format(self.logging.format.into()))
    }
}
