//! Configuration for the Dify SDK and CLI.
//!
//! Provides TOML-based configuration with:
//! - Connection settings (`base_url`, `api_key`, default `user`, timeouts)
//! - SSE stream settings (`[stream]`)
//! - Config file layering (user config + project-local overrides)
//! - Environment overrides (`DIFY_BASE_URL`, `DIFY_API_KEY`, `DIFY_USER`)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, discover, load_config, load_config_file,
    load_config_with_options, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
