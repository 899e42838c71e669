//! Recent command - listening history.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use console::{Style, style};
use statify_client::{PlayHistory, api::DEFAULT_LIMIT};

use super::{Context, truncate};
use crate::client;

/// Arguments for the recent command.
#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Number of plays (1-50)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

/// Run the recent command.
pub async fn run(args: RecentArgs, ctx: &Context) -> Result<()> {
    let client = client::spotify_client(ctx)?;
    let history = client.recently_played(args.limit).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&history.items)?);
    } else {
        print_history(&history.items, Utc::now());
    }
    Ok(())
}

pub(crate) fn print_history(items: &[PlayHistory], now: DateTime<Utc>) {
    let dim = Style::new().dim();
    println!();
    println!("{}", style("Recently Played").bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    if items.is_empty() {
        println!("{}", dim.apply_to("No recent playback"));
    }
    for play in items {
        println!(
            "  {} {} {}",
            dim.apply_to(format!("{:>8}", relative_time(&play.played_at, now))),
            truncate(&play.track.name, 40),
            dim.apply_to(format!("— {}", truncate(&play.track.artist_names(), 30)))
        );
    }
    println!();
}

/// "just now", "5m ago", "3h ago", "2d ago"; the raw value if unparseable.
pub(crate) fn relative_time(played_at: &str, now: DateTime<Utc>) -> String {
    let Ok(at) = DateTime::parse_from_rfc3339(played_at) else {
        return played_at.to_string();
    };
    let secs = (now - at.with_timezone(&Utc)).num_seconds().max(0);
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(relative_time("2024-05-01T11:59:30.000Z", now), "just now");
        assert_eq!(relative_time("2024-05-01T11:45:00Z", now), "15m ago");
        assert_eq!(relative_time("2024-05-01T09:00:00Z", now), "3h ago");
        assert_eq!(relative_time("2024-04-28T12:00:00Z", now), "3d ago");
        assert_eq!(relative_time("yesterday", now), "yesterday");
    }
}
