//! Session and API client construction for commands.
//!
//! Maps the layered [`StatifyConfig`] onto the OAuth settings and wires the
//! file-backed session store under the config directory.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use statify_client::SpotifyClient;
use statify_config::StatifyConfig;
use statify_oauth::{
    FileSessionStore, Navigator, NoopNavigator, OAuthConfig, OAuthError, SessionManager,
};
use url::Url;

use crate::commands::Context;

/// Build the OAuth settings from config, keeping Spotify defaults for
/// anything unset.
pub fn oauth_config(config: &StatifyConfig) -> OAuthConfig {
    let spotify = config.spotify();
    let mut oauth = OAuthConfig::spotify();

    oauth.client_id = spotify.client_id.filter(|v| !v.trim().is_empty());
    oauth.redirect_uri = spotify.redirect_uri.filter(|v| !v.trim().is_empty());
    if let Some(url) = spotify.authorize_url {
        oauth.authorize_url = url;
    }
    if let Some(url) = spotify.token_url {
        oauth.token_url = url;
    }
    if let Some(url) = spotify.api_base_url {
        oauth.api_base_url = url;
    }
    if let Some(scopes) = spotify.scopes {
        oauth.scopes = scopes;
    }
    if let Some(secs) = spotify.refresh_skew_secs {
        oauth.refresh_skew = Duration::from_secs(secs);
    }
    oauth
}

/// Session manager persisting to `<config_dir>/session.json`.
pub fn session_manager(ctx: &Context, navigator: Arc<dyn Navigator>) -> Result<SessionManager> {
    let manager = SessionManager::builder(oauth_config(&ctx.config))
        .store(Arc::new(FileSessionStore::new(&ctx.config_dir)))
        .navigator(navigator)
        .build()
        .context("Invalid Spotify configuration")?;
    Ok(manager)
}

/// API client for commands that only read or write Spotify data.
pub fn spotify_client(ctx: &Context) -> Result<SpotifyClient> {
    let session = session_manager(ctx, Arc::new(NoopNavigator))?;
    Ok(SpotifyClient::new(Arc::new(session)))
}

/// Opens the authorization URL in the default browser.
///
/// Failing to launch a browser is not fatal: the URL is printed as well.
#[derive(Debug, Default)]
pub struct BrowserNavigator {
    disabled: bool,
}

impl BrowserNavigator {
    pub fn new(disabled: bool) -> Self {
        Self { disabled }
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &Url) -> statify_oauth::Result<()> {
        if self.disabled {
            return Ok(());
        }
        if let Err(e) = open_url(url.as_str()) {
            tracing::warn!(error = %e, "Could not open browser");
        }
        Ok(())
    }
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}

/// One-line hint for errors that need user action.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(client_err) = err.downcast_ref::<statify_client::Error>() {
        if client_err.requires_login() {
            return Some("Run 'statify auth login' to connect your Spotify account.");
        }
        if client_err.is_rate_limited() {
            return Some("Spotify is rate limiting requests; try again in a minute.");
        }
    }
    if let Some(OAuthError::Configuration(_)) = err.downcast_ref::<OAuthError>() {
        return Some("Set a client id and redirect URI: 'statify config init --help'.");
    }
    None
}
