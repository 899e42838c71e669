//! CLI command handlers.

use std::path::PathBuf;

use console::Style;
use statify_config::{LoadedConfig, SpotifyConfig, StatifyConfig};

use crate::client;

pub mod auth;
pub mod config;
pub mod me;
pub mod playlist;
pub mod recent;
pub mod stats;
pub mod top;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (files, environment and CLI flags merged).
    pub config: StatifyConfig,
    /// What the file discovery found, for `config which`.
    pub loaded: LoadedConfig,
    /// Directory holding the session file and logs.
    pub config_dir: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Apply `--client-id` / `--redirect-uri` on top of the loaded config.
pub fn apply_cli_overrides(
    config: &mut StatifyConfig,
    client_id: Option<String>,
    redirect_uri: Option<String>,
) {
    if client_id.is_none() && redirect_uri.is_none() {
        return;
    }
    config.merge(StatifyConfig {
        spotify: Some(SpotifyConfig {
            client_id,
            redirect_uri,
            ..Default::default()
        }),
        logging: None,
    });
}

/// Print an error with an actionable hint when one applies.
pub fn print_error(err: &anyhow::Error) {
    let red = Style::new().red();
    let dim = Style::new().dim();
    eprintln!("{} {:#}", red.apply_to("Error:"), err);
    if let Some(hint) = client::hint_for(err) {
        eprintln!("{}", dim.apply_to(hint));
    }
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
