//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/dify/config.toml` (user config, or `DIFY_CONFIG_DIR`)
//! 2. `./dify.toml` (project-local)
//! 3. `DIFY_BASE_URL`, `DIFY_API_KEY`, `DIFY_USER`
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, DifyConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "dify.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "dify";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "DIFY_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DifyConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (unreadable layers, keys in
    /// project files).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all layers, then applying
/// environment overrides.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `DIFY_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = discover(project_dir, config_dir)?;
    loaded.config.apply_env(|name| std::env::var(name).ok());
    Ok(loaded)
}

/// Discover and merge file layers without consulting the environment.
pub fn discover(project_dir: Option<&Path>, config_dir: Option<&Path>) -> Result<LoadedConfig> {
    let mut config = DifyConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings)?);
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    let before = config.api_key.clone();
    let source = load_layer(&mut config, &project_path, &mut warnings)?;
    if source.loaded && config.api_key.is_some() && config.api_key != before {
        warnings.push(format!(
            "{} contains an API key. Project files are often committed; \
             consider {} or the user config instead.",
            project_path.display(),
            crate::API_KEY_ENV
        ));
    }
    sources.push(source);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DifyConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DifyConfig::from_toml(&contents)
}

/// Get the user config file path.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for dify.
///
/// Checks `DIFY_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut DifyConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ConfigSource> {
    if !path.is_file() {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        });
    }

    match load_config_file(path) {
        Ok(layer) => {
            debug!(path = %path.display(), "Loaded config layer");
            config.merge(layer);
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            })
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"http://localhost:5001/v1\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:5001/v1"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = discover(Some(project.path()), Some(user.path())).unwrap();

        assert_eq!(loaded.config, DifyConfig::new());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_discover_layered_merge() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
base_url = "https://api.dify.ai/v1"
api_key = "app-user"
timeout_secs = 20

[stream]
buffer_size = 4096
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("dify.toml"),
            r#"
base_url = "http://localhost:5001/v1"
user = "local-dev"

[stream]
encoding_base64 = true
"#,
        )
        .unwrap();

        let loaded = discover(Some(project.path()), Some(user.path())).unwrap();
        let config = &loaded.config;

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:5001/v1"));
        assert_eq!(config.api_key.as_deref(), Some("app-user"));
        assert_eq!(config.user.as_deref(), Some("local-dev"));
        assert_eq!(config.timeout_secs, Some(20));
        // the project's [stream] table adds to the user's, it does not replace it
        assert_eq!(config.stream_config().buffer_size, 4096);
        assert!(config.stream_config().encoding_base64);
        assert_eq!(loaded.loaded_from().len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_project_api_key_warns() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("dify.toml"), "api_key = \"app-leaky\"\n").unwrap();

        let loaded = discover(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config.api_key.as_deref(), Some("app-leaky"));
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("API key"));
    }

    #[test]
    fn test_malformed_layer_warns_but_continues() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "user = \"kept\"\n").unwrap();
        fs::write(project.path().join("dify.toml"), "not valid toml {{{{").unwrap();

        let loaded = discover(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config.user.as_deref(), Some("kept"));
        assert_eq!(loaded.loaded_from().len(), 1);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
    }
}
