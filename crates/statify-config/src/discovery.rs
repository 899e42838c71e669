//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/statify/config.toml` (XDG user config)
//! 2. `./statify.toml` (project-local)
//! 3. `STATIFY_CLIENT_ID` / `STATIFY_REDIRECT_URI` environment variables
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SpotifyConfig, StatifyConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "statify.toml";

/// Default config filename within XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "statify";

/// Environment variable to override the config directory.
///
/// When set, this takes precedence over the platform default. The session
/// file and logs live under the same directory.
pub const CONFIG_DIR_ENV: &str = "STATIFY_CONFIG_DIR";

/// Environment variable overriding `[spotify] client_id`.
pub const CLIENT_ID_ENV: &str = "STATIFY_CLIENT_ID";

/// Environment variable overriding `[spotify] redirect_uri`.
pub const REDIRECT_URI_ENV: &str = "STATIFY_REDIRECT_URI";

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
    pub config: StatifyConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<&'static str>,
    /// Warnings generated during loading (e.g., unreadable files).
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

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `STATIFY_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    load_config_with_env(project_dir, config_dir, |key| std::env::var(key).ok())
}

/// Layered load with a custom environment lookup.
pub fn load_config_with_env(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut config = StatifyConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    // 3. Environment
    let env_overrides = apply_env_overrides(&mut config, env);

    check_client_secret(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        env_overrides,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<StatifyConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    StatifyConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &StatifyConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Get the XDG config file path for statify.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the XDG config directory for statify.
///
/// Checks `STATIFY_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/statify` on Linux, `~/Library/Application Support/statify` on macOS).
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
///
/// Missing files are skipped silently; unreadable or malformed ones produce
/// a warning.
fn load_layer(config: &mut StatifyConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

fn apply_env_overrides(
    config: &mut StatifyConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    let mut layer = SpotifyConfig::default();

    if let Some(client_id) = env(CLIENT_ID_ENV).filter(|v| !v.is_empty()) {
        layer.client_id = Some(client_id);
        applied.push(CLIENT_ID_ENV);
    }
    if let Some(redirect_uri) = env(REDIRECT_URI_ENV).filter(|v| !v.is_empty()) {
        layer.redirect_uri = Some(redirect_uri);
        applied.push(REDIRECT_URI_ENV);
    }

    if !applied.is_empty() {
        config.merge(StatifyConfig {
            spotify: Some(layer),
            logging: None,
        });
    }
    applied
}

fn check_client_secret(config: &StatifyConfig, warnings: &mut Vec<String>) {
    if let Some(ref spotify) = config.spotify
        && spotify.client_secret.is_some()
    {
        warnings.push(
            "[spotify] contains a client_secret. PKCE logins never send it; \
             remove it from the config file."
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
