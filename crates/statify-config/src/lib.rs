//! Configuration system for Statify.
//!
//! Provides TOML-based configuration with:
//! - The `[spotify]` app registration (client id, redirect URI, endpoints, scopes)
//! - `[logging]` settings for the CLI
//! - Config file layering (XDG user config + project-local overrides + environment)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    CLIENT_ID_ENV, CONFIG_DIR_ENV, ConfigSource, LoadedConfig, REDIRECT_URI_ENV, load_config,
    load_config_file, load_config_with_env, load_config_with_options, save_config,
    xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
