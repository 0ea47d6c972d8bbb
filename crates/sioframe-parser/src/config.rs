//! Parser configuration.

use crate::error::{ParserError, ParserResult};

/// Default maximum size of a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Upper bound on the attachment count a binary packet may declare.
    /// `None` accepts any count.
    pub max_attachments: Option<u64>,

    /// Maximum size of a single frame, text or binary. Applied by the
    /// decoder to every frame it ingests and by the stream reader and writer
    /// to every frame body.
    pub max_frame_size: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_attachments: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ParserConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the attachment limit.
    pub fn with_max_attachments(mut self, max: u64) -> Self {
        self.max_attachments = Some(max);
        self
    }

    /// Builder: set the frame size limit.
    pub fn with_max_frame_size(mut self, max: u32) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Checks a frame length against `max_frame_size`.
    pub fn check_frame_size(&self, len: usize) -> ParserResult<u32> {
        let max = self.max_frame_size;
        match u32::try_from(len) {
            Ok(size) if size <= max => Ok(size),
            Ok(size) => Err(ParserError::FrameTooLarge { size, max }),
            Err(_) => Err(ParserError::FrameTooLarge {
                size: u32::MAX,
                max,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.max_attachments, None);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn custom_config() {
        let config = ParserConfig::new()
            .with_max_attachments(8)
            .with_max_frame_size(1024);
        assert_eq!(config.max_attachments, Some(8));
        assert_eq!(config.max_frame_size, 1024);
    }

    #[test]
    fn frame_size_check() {
        let config = ParserConfig::new().with_max_frame_size(4);
        assert_eq!(config.check_frame_size(4).unwrap(), 4);
        assert!(matches!(
            config.check_frame_size(5),
            Err(ParserError::FrameTooLarge { size: 5, max: 4 })
        ));
    }
}
