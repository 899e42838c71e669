//! Me command - the logged in user's profile.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;
use crate::client;

/// Arguments for the me command.
#[derive(Args, Debug)]
pub struct MeArgs {}

/// Run the me command.
pub async fn run(_args: MeArgs, ctx: &Context) -> Result<()> {
    let client = client::spotify_client(ctx)?;
    let profile = client.profile().await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style(profile.name()).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("User:"), profile.id);
    if let Some(email) = &profile.email {
        println!("  {} {}", dim.apply_to("Email:"), email);
    }
    if let Some(country) = &profile.country {
        println!("  {} {}", dim.apply_to("Country:"), country);
    }
    if let Some(product) = &profile.product {
        println!("  {} {}", dim.apply_to("Plan:"), product);
    }
    if let Some(followers) = profile.followers {
        println!("  {} {}", dim.apply_to("Followers:"), followers.total);
    }
    if let Some(url) = &profile.external_urls.spotify {
        println!("  {} {}", dim.apply_to("Profile:"), url);
    }
    println!();

    Ok(())
}
