//! Statify - Spotify listening stats from the terminal
//!
//! Main entry point for the Statify CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;

use commands::{auth, config, me, playlist, recent, stats, top};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Statify - Spotify listening stats from the terminal
#[derive(Parser)]
#[command(name = "statify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding config.toml, the session file and logs
    #[arg(long, global = true, env = "STATIFY_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Spotify application client id (overrides config and STATIFY_CLIENT_ID)
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Redirect URI registered for the application
    #[arg(long, global = true)]
    pub redirect_uri: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, show session status, log out
    Auth(auth::AuthArgs),

    /// Show your Spotify profile
    Me(me::MeArgs),

    /// Show your top artists or tracks
    Top(top::TopArgs),

    /// Show recently played tracks
    Recent(recent::RecentArgs),

    /// Show top artists, top tracks and recent plays together
    Stats(stats::StatsArgs),

    /// Save your top tracks as a playlist
    Playlist(playlist::PlaylistArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(statify_config::xdg_config_dir)
        .unwrap_or_else(|| PathBuf::from(".statify"));

    let loaded = statify_config::load_config_with_options(None, Some(&config_dir))?;
    let mut config = loaded.config.clone();
    commands::apply_cli_overrides(&mut config, cli.client_id, cli.redirect_uri);

    // Initialize tracing: console (human-readable) + rotating JSON file
    let logging = config.logging();
    let filter = if cli.verbose {
        "statify=debug,statify_oauth=debug,statify_client=debug,statify_config=debug,info".to_string()
    } else {
        logging
            .level
            .clone()
            .unwrap_or_else(|| "statify=warn,statify_oauth=warn,statify_client=warn,error".to_string())
    };

    let (file_writer, log_guard) = if logging.file_enabled() {
        let file_appender = tracing_appender::rolling::daily(config_dir.join("logs"), "statify.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "statify=trace,statify_oauth=trace,statify_client=trace,statify_config=trace,info",
                ))
        }))
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    // Create context for commands
    let ctx = commands::Context {
        config,
        loaded,
        config_dir,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    let result = match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Me(args) => me::run(args, &ctx).await,
        Commands::Top(args) => top::run(args, &ctx).await,
        Commands::Recent(args) => recent::run(args, &ctx).await,
        Commands::Stats(args) => stats::run(args, &ctx).await,
        Commands::Playlist(args) => playlist::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        commands::print_error(&e);
        // Flush the file log before exiting.
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
