//! Auth command - Spotify login, status and logout.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;
use statify_oauth::{RedirectParams, SessionState};

use super::Context;
use crate::client::{self, BrowserNavigator};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in to Spotify via OAuth (PKCE)
    Login {
        /// Print the login URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,

        /// Start a new login even if a session exists
        #[arg(long)]
        force: bool,
    },

    /// Show authentication status
    Status,

    /// Clear the stored session
    Logout,
}

/// Status output for `--json`.
#[derive(Debug, Serialize)]
struct StatusOutput {
    configured: bool,
    state: String,
    expires_in_secs: Option<u64>,
    can_refresh: Option<bool>,
    scope: Option<String>,
    session_file: String,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { no_browser, force } => cmd_login(ctx, no_browser, force).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
    }
}

async fn cmd_login(ctx: &Context, no_browser: bool, force: bool) -> Result<()> {
    let session = client::session_manager(ctx, Arc::new(BrowserNavigator::new(no_browser)))?;
    let dim = Style::new().dim();

    if !session.has_config() {
        bail!(
            "Spotify is not configured. Set STATIFY_CLIENT_ID and STATIFY_REDIRECT_URI, \
             pass --client-id/--redirect-uri, or run 'statify config init'."
        );
    }

    if !force
        && session.session_state().await == SessionState::Active
        && let Some(info) = session.token_info().await
    {
        println!(
            "Already logged in (token expires in {})",
            info.expires_in_display()
        );
        println!(
            "{}",
            dim.apply_to("Run 'statify auth logout' or pass --force to log in again.")
        );
        return Ok(());
    }

    let pending = session.initiate_login().await?;

    println!("{}", style("Spotify Login").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("Open this URL in your browser:");
    println!();
    println!("  {}", pending.url);
    println!();
    println!("After approving access you'll be redirected to your redirect URI.");
    println!("Copy the full URL from the address bar and paste it here:");
    println!();

    print!("redirect URL> ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        println!("No input provided, aborting.");
        return Ok(());
    }

    let redirect = RedirectParams::from_url(input)?;
    redirect.verify_state(&pending.state)?;

    println!("Exchanging code for tokens...");
    let record = session.complete_login(redirect).await?;

    let green = Style::new().green();
    println!();
    println!("{} Logged in to Spotify", green.apply_to("✓"));
    if let Some(info) = session.token_info().await {
        println!("  {} {}", dim.apply_to("Expires:"), info.expires_in_display());
    }
    if !record.scope.is_empty() {
        println!("  {} {}", dim.apply_to("Scope:"), record.scope);
    }

    Ok(())
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let session = client::session_manager(ctx, Arc::new(BrowserNavigator::new(true)))?;
    let state = session.session_state().await;
    let info = session.token_info().await;
    let session_file = ctx.config_dir.join(statify_oauth::store::SESSION_FILE);

    if ctx.json_output {
        let output = StatusOutput {
            configured: session.has_config(),
            state: state.to_string(),
            expires_in_secs: info.as_ref().map(|i| i.expires_in_secs),
            can_refresh: info.as_ref().map(|i| i.can_refresh),
            scope: info.map(|i| i.scope),
            session_file: session_file.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    let yellow = Style::new().yellow();

    println!();
    println!("{}", style("Authentication Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if session.has_config() {
        println!("  {} {}", dim.apply_to("Config:"), green.apply_to("● configured"));
    } else {
        println!(
            "  {} {}",
            dim.apply_to("Config:"),
            yellow.apply_to("● missing client id or redirect URI")
        );
    }

    let state_style = match state {
        SessionState::Active => &green,
        _ => &yellow,
    };
    println!(
        "  {} {}",
        dim.apply_to("Session:"),
        state_style.apply_to(format!("● {}", state))
    );

    if let Some(info) = info {
        println!("  {} {}", dim.apply_to("Expires:"), info.expires_in_display());
        println!(
            "  {} {}",
            dim.apply_to("Refresh:"),
            if info.can_refresh { "available" } else { "none" }
        );
        if !info.scope.is_empty() {
            println!("  {} {}", dim.apply_to("Scope:"), info.scope);
        }
    } else {
        println!();
        println!(
            "  {}",
            dim.apply_to("Run 'statify auth login' to connect your Spotify account.")
        );
    }

    if ctx.verbose {
        println!("  {} {}", dim.apply_to("File:"), session_file.display());
    }
    println!();

    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let session = client::session_manager(ctx, Arc::new(BrowserNavigator::new(true)))?;

    if session.session_state().await == SessionState::NoSession {
        println!("No Spotify session found.");
        return Ok(());
    }

    session.clear_session().await?;
    println!("Spotify session removed.");
    Ok(())
}
