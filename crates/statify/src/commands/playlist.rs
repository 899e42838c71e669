//! Playlist command - save top tracks as a new playlist.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use statify_client::{NewPlaylist, TimeRange, api::DEFAULT_LIMIT};

use super::Context;
use crate::client;

/// Arguments for the playlist command.
#[derive(Args, Debug)]
pub struct PlaylistArgs {
    /// Time range of the top tracks to save
    #[arg(short, long, default_value = "medium_term")]
    pub range: TimeRange,

    /// Number of top tracks to include (1-50)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,

    /// Playlist name (default: "Statify • <range>")
    #[arg(long)]
    pub name: Option<String>,

    /// Make the playlist public
    #[arg(long)]
    pub public: bool,
}

pub(crate) fn default_name(range: TimeRange) -> String {
    format!("Statify • {}", range.label())
}

pub(crate) fn default_description(range: TimeRange) -> String {
    format!(
        "Auto-generated via Statify for your {}.",
        range.label().to_lowercase()
    )
}

/// Run the playlist command.
pub async fn run(args: PlaylistArgs, ctx: &Context) -> Result<()> {
    let client = client::spotify_client(ctx)?;

    let top = client.top();
    let (profile, tracks) = tokio::join!(
        client.profile(),
        top.tracks(args.range, args.limit)
    );
    let profile = profile?;
    let track_uris: Vec<String> = tracks?
        .items
        .into_iter()
        .map(|t| t.uri)
        .filter(|uri| !uri.is_empty())
        .collect();

    if track_uris.is_empty() {
        bail!("No top tracks for {} yet, nothing to save.", args.range.label());
    }

    let count = track_uris.len();
    let playlist = client
        .create_playlist_with_tracks(
            &profile.id,
            NewPlaylist {
                name: args.name.unwrap_or_else(|| default_name(args.range)),
                description: Some(default_description(args.range)),
                public: args.public,
                track_uris,
            },
        )
        .await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&playlist)?);
        return Ok(());
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    println!(
        "{} Created '{}' with {} tracks",
        green.apply_to("✓"),
        playlist.name,
        count
    );
    if let Some(url) = &playlist.external_urls.spotify {
        println!("  {}", dim.apply_to(url));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        assert_eq!(default_name(TimeRange::ShortTerm), "Statify • Last 4 Weeks");
        assert_eq!(
            default_description(TimeRange::LongTerm),
            "Auto-generated via Statify for your last 12 months."
        );
    }
}
