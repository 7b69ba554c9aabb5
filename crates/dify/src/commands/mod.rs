//! CLI command handlers.

pub mod detail;
pub mod logs;
pub mod run;
pub mod stop;

use anyhow::{Result, bail};
use dify_client::DifyClient;
use dify_config::DifyConfig;

/// End-user identifier used when neither `--user` nor config sets one.
const DEFAULT_USER: &str = "dify-cli";

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration (files, environment, flags).
    pub config: DifyConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Build an API client from the merged configuration.
    pub fn client(&self) -> Result<DifyClient> {
        client_for(&self.config)
    }

    /// Resolve the end-user identifier.
    pub fn user(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.config.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string())
    }
}

pub(crate) fn client_for(config: &DifyConfig) -> Result<DifyClient> {
    if config.base_url.is_none() {
        bail!("no API base URL configured; pass --base-url, set DIFY_BASE_URL, or add base_url to dify.toml");
    }
    Ok(DifyClient::from_config(config)?)
}
