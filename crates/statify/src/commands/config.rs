//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::Style;
use statify_config::{SpotifyConfig, StatifyConfig};

use super::Context;
use crate::client;

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Write a config file from --client-id and --redirect-uri
    Init {
        /// Create project-local config (./statify.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local, force } => cmd_init(ctx, local, force),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let oauth = client::oauth_config(&ctx.config);

    if ctx.json_output {
        let output = serde_json::json!({
            "client_id": oauth.client_id,
            "redirect_uri": oauth.redirect_uri,
            "authorize_url": oauth.authorize_url,
            "token_url": oauth.token_url,
            "api_base_url": oauth.api_base_url,
            "scopes": oauth.scopes,
            "refresh_skew_secs": oauth.refresh_skew.as_secs(),
            "configured": oauth.has_config(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let unset = || dim.apply_to("(not set)").to_string();

    println!("# Statify Configuration\n");
    println!("[spotify]");
    println!(
        "client_id     = {}",
        oauth.client_id.clone().unwrap_or_else(unset)
    );
    println!(
        "redirect_uri  = {}",
        oauth.redirect_uri.clone().unwrap_or_else(unset)
    );
    println!("authorize_url = {}", oauth.authorize_url);
    println!("token_url     = {}", oauth.token_url);
    println!("api_base_url  = {}", oauth.api_base_url);
    println!("scopes        = {}", oauth.scope_param());
    println!("refresh_skew  = {}s", oauth.refresh_skew.as_secs());

    let logging = ctx.config.logging();
    println!();
    println!("[logging]");
    println!(
        "level = {}",
        logging.level.clone().unwrap_or_else(|| "(default)".to_string())
    );
    println!("file  = {}", logging.file_enabled());

    if !ctx.loaded.env_overrides.is_empty() {
        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "Overridden by environment: {}",
                ctx.loaded.env_overrides.join(", ")
            ))
        );
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }
    for var in &ctx.loaded.env_overrides {
        println!("  ✓ env     {}", var);
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'statify config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(ctx: &Context, local: bool, force: bool) -> Result<()> {
    let spotify = ctx.config.spotify();
    let Some(client_id) = spotify.client_id else {
        bail!("Pass the client id from the Spotify developer dashboard with --client-id.");
    };
    let redirect_uri = spotify
        .redirect_uri
        .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    let path = if local {
        PathBuf::from("statify.toml")
    } else {
        ctx.config_dir.join("config.toml")
    };

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Pass --force to overwrite it.");
        return Ok(());
    }

    let config = StatifyConfig {
        spotify: Some(SpotifyConfig {
            client_id: Some(client_id),
            redirect_uri: Some(redirect_uri),
            ..Default::default()
        }),
        logging: None,
    };
    statify_config::save_config(&config, &path)?;

    let green = Style::new().green();
    println!("{} Wrote {}", green.apply_to("✓"), path.display());
    println!("Run 'statify auth login' to connect your Spotify account.");
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config_dir.join("config.toml").display());
    Ok(())
}
