//! Configuration types.
//!
//! ```toml
//! base_url = "https://api.dify.ai/v1"
//! api_key = "app-..."
//! user = "abc-123"
//! timeout_secs = 30
//! stream_timeout_secs = 600
//!
//! [stream]
//! encoding_base64 = false
//! buffer_size = 65536
//! ```

use std::time::Duration;

use dify_sse::StreamConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "DIFY_BASE_URL";

/// Environment variable holding the application API key.
pub const API_KEY_ENV: &str = "DIFY_API_KEY";

/// Environment variable holding the default end-user identifier.
pub const USER_ENV: &str = "DIFY_USER";

/// One configuration layer. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifyConfig {
    /// API base URL, e.g. `https://api.dify.ai/v1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Application API key, sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default end-user identifier attached to requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Timeout for blocking requests, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// How long a streaming run may take to start responding, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_timeout_secs: Option<u64>,

    /// SSE stream settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamSection>,
}

/// The `[stream]` table of one layer. Keys are merged one by one, so a
/// layer that sets only `encoding_base64` keeps a `buffer_size` from the
/// layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSection {
    /// Decode `data` payloads as Base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_base64: Option<bool>,

    /// Initial read buffer size, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

impl StreamSection {
    fn merge(&mut self, other: StreamSection) {
        if other.encoding_base64.is_some() {
            self.encoding_base64 = other.encoding_base64;
        }
        if other.buffer_size.is_some() {
            self.buffer_size = other.buffer_size;
        }
    }

    /// Resolve against the stream defaults.
    pub fn resolve(&self) -> StreamConfig {
        let mut config = StreamConfig::default();
        if let Some(enabled) = self.encoding_base64 {
            config = config.with_base64(enabled);
        }
        if let Some(size) = self.buffer_size {
            config = config.with_buffer_size(size);
        }
        config
    }
}

impl DifyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another layer on top of this one. Fields set in `other` win.
    pub fn merge(&mut self, other: DifyConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.stream_timeout_secs.is_some() {
            self.stream_timeout_secs = other.stream_timeout_secs;
        }
        if let Some(stream) = other.stream {
            self.stream.get_or_insert_with(StreamSection::default).merge(stream);
        }
    }

    /// Apply overrides from environment-style lookups.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(user) = get(USER_ENV) {
            self.user = Some(user);
        }
    }

    /// Blocking request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Streaming request timeout.
    pub fn stream_timeout(&self) -> Option<Duration> {
        self.stream_timeout_secs.map(Duration::from_secs)
    }

    /// Stream settings, falling back to defaults for unset keys.
    pub fn stream_config(&self) -> StreamConfig {
        self.stream
            .as_ref()
            .map(StreamSection::resolve)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref stream) = self.stream
            && stream.buffer_size == Some(0)
        {
            return Err(ConfigError::InvalidValue {
                field: "stream.buffer_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.stream_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "stream_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
