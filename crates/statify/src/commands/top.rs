//! Top command - top artists or tracks for a time range.

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::{Style, style};
use statify_client::{Artist, TimeRange, Track, api::DEFAULT_LIMIT};

use super::{Context, truncate};
use crate::client;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TopKind {
    Artists,
    Tracks,
}

/// Arguments for the top command.
#[derive(Args, Debug)]
pub struct TopArgs {
    /// What to rank
    #[arg(value_enum)]
    pub kind: TopKind,

    /// Time range: short_term (4 weeks), medium_term (6 months), long_term (12 months)
    #[arg(short, long, default_value = "medium_term")]
    pub range: TimeRange,

    /// Number of items (1-50)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

/// Run the top command.
pub async fn run(args: TopArgs, ctx: &Context) -> Result<()> {
    let client = client::spotify_client(ctx)?;

    match args.kind {
        TopKind::Artists => {
            let page = client.top().artists(args.range, args.limit).await?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
            } else {
                print_artists(&page.items, args.range);
            }
        }
        TopKind::Tracks => {
            let page = client.top().tracks(args.range, args.limit).await?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
            } else {
                print_tracks(&page.items, args.range);
            }
        }
    }

    Ok(())
}

pub(crate) fn print_artists(artists: &[Artist], range: TimeRange) {
    let dim = Style::new().dim();
    println!();
    println!("{} {}", style("Top Artists").bold(), dim.apply_to(format!("· {}", range.label())));
    println!("{}", dim.apply_to("─".repeat(50)));

    if artists.is_empty() {
        println!("{}", dim.apply_to("No artists in this window yet"));
    }
    for (rank, artist) in artists.iter().enumerate() {
        let genres = artist.genres.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        println!(
            "{:>3}. {} {}",
            rank + 1,
            truncate(&artist.name, 40),
            dim.apply_to(genres)
        );
    }
    println!();
}

pub(crate) fn print_tracks(tracks: &[Track], range: TimeRange) {
    let dim = Style::new().dim();
    println!();
    println!("{} {}", style("Top Tracks").bold(), dim.apply_to(format!("· {}", range.label())));
    println!("{}", dim.apply_to("─".repeat(50)));

    if tracks.is_empty() {
        println!("{}", dim.apply_to("No tracks in this window yet"));
    }
    for (rank, track) in tracks.iter().enumerate() {
        println!(
            "{:>3}. {} {} {}",
            rank + 1,
            truncate(&track.name, 40),
            dim.apply_to(format!("— {}", truncate(&track.artist_names(), 30))),
            dim.apply_to(track.duration_display())
        );
    }
    println!();
}
