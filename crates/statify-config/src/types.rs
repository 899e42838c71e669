//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [spotify]                # app registration and endpoints
//! [logging]                # log level and file logging
//! ```

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatifyConfig {
    /// Spotify application settings.
    pub spotify: Option<SpotifyConfig>,

    /// Logging settings.
    pub logging: Option<LoggingConfig>,
}

impl StatifyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections merge field by field, so a project file that only sets
    /// `redirect_uri` keeps the user's `client_id`.
    pub fn merge(&mut self, other: StatifyConfig) {
        self.spotify = match (self.spotify.take(), other.spotify) {
            (Some(mut base), Some(over)) => {
                base.merge(over);
                Some(base)
            }
            (base, over) => over.or(base),
        };

        self.logging = match (self.logging.take(), other.logging) {
            (Some(mut base), Some(over)) => {
                base.merge(over);
                Some(base)
            }
            (base, over) => over.or(base),
        };
    }

    /// The `[spotify]` section, or an empty one.
    pub fn spotify(&self) -> SpotifyConfig {
        self.spotify.clone().unwrap_or_default()
    }

    /// The `[logging]` section, or an empty one.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Whether a client id and redirect URI are both configured.
    pub fn has_credentials(&self) -> bool {
        self.spotify
            .as_ref()
            .is_some_and(SpotifyConfig::has_credentials)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Spotify
// ─────────────────────────────────────────────────────────────────────────────

/// The `[spotify]` section.
///
/// Unset endpoints fall back to the public Spotify URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Client id of the registered Spotify application.
    pub client_id: Option<String>,
    /// Redirect URI registered for the application.
    pub redirect_uri: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
    /// Scopes requested at login.
    pub scopes: Option<Vec<String>>,
    /// Seconds before expiry at which a token is refreshed.
    pub refresh_skew_secs: Option<u64>,
    /// Never used by PKCE logins; only read so it can be warned about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl SpotifyConfig {
    /// Whether a non-empty client id and redirect URI are present.
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.client_id) && set(&self.redirect_uri)
    }

    fn merge(&mut self, other: SpotifyConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            client_id,
            redirect_uri,
            authorize_url,
            token_url,
            api_base_url,
            scopes,
            refresh_skew_secs,
            client_secret
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// The `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter directive, e.g. `"info"` or `"statify_oauth=debug"`.
    pub level: Option<String>,
    /// Whether to write daily JSON log files. Defaults to `true`.
    pub file: Option<bool>,
}

impl LoggingConfig {
    pub fn file_enabled(&self) -> bool {
        self.file.unwrap_or(true)
    }

    fn merge(&mut self, other: LoggingConfig) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }
}
