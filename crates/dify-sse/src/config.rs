//! Stream configuration.
//!
//! ```toml
//! [stream]
//! encoding_base64 = false
//! buffer_size = 65536
//! ```

use serde::{Deserialize, Serialize};

/// Default initial buffer for the frame reader (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 16;

/// Per-stream settings, fixed when the stream is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Decode every event's `data` field as standard Base64.
    pub encoding_base64: bool,
    /// Initial frame buffer size. The buffer still grows past this for
    /// long events.
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            encoding_base64: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl StreamConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable Base64 decoding of payloads.
    pub fn with_base64(mut self, enabled: bool) -> Self {
        self.encoding_base64 = enabled;
        self
    }

    /// Set the initial frame buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert!(!config.encoding_base64);
        assert_eq!(config.buffer_size, 65536);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: StreamConfig = serde_json::from_str(r#"{"encoding_base64": true}"#).unwrap();
        assert!(config.encoding_base64);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_builders() {
        let config = StreamConfig::new().with_base64(true).with_buffer_size(16);
        assert!(config.encoding_base64);
        assert_eq!(config.buffer_size, 16);
    }
}
