//! Stats command - top artists, top tracks and recent plays in one view.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use statify_client::{Artist, PlayHistory, TimeRange, Track, api::DEFAULT_LIMIT};

use super::{Context, recent, top};
use crate::client;

/// Arguments for the stats command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Time range: short_term (4 weeks), medium_term (6 months), long_term (12 months)
    #[arg(short, long, default_value = "medium_term")]
    pub range: TimeRange,

    /// Items per section (1-50)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

/// Summary figures derived from the loaded sections.
#[derive(Debug, Default, PartialEq, Serialize)]
pub(crate) struct Insights {
    top_genre: Option<String>,
    average_popularity: Option<u32>,
    unique_artists: usize,
}

#[derive(Debug, Serialize)]
struct StatsOutput<'a> {
    time_range: TimeRange,
    top_artists: &'a [Artist],
    top_tracks: &'a [Track],
    recently_played: &'a [PlayHistory],
    insights: &'a Insights,
}

/// Run the stats command.
pub async fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let client = client::spotify_client(ctx)?;

    // The three sections load concurrently and share one token refresh.
    let top_api = client.top();
    let (artists, tracks, recent) = tokio::join!(
        top_api.artists(args.range, args.limit),
        top_api.tracks(args.range, args.limit),
        client.recently_played(args.limit),
    );
    let (artists, tracks, recent) = (artists?.items, tracks?.items, recent?.items);
    let insights = insights(&artists, &tracks);

    if ctx.json_output {
        let output = StatsOutput {
            time_range: args.range,
            top_artists: &artists,
            top_tracks: &tracks,
            recently_played: &recent,
            insights: &insights,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    top::print_artists(&artists, args.range);
    top::print_tracks(&tracks, args.range);
    recent::print_history(&recent, Utc::now());
    print_insights(&insights, args.range);
    Ok(())
}

pub(crate) fn insights(artists: &[Artist], tracks: &[Track]) -> Insights {
    let mut genre_count: HashMap<&str, usize> = HashMap::new();
    for genre in artists.iter().flat_map(|a| a.genres.iter()) {
        *genre_count.entry(genre.as_str()).or_default() += 1;
    }
    // Ties go to the alphabetically first genre so output is stable.
    let top_genre = genre_count
        .into_iter()
        .max_by(|(ga, ca), (gb, cb)| ca.cmp(cb).then_with(|| gb.cmp(ga)))
        .map(|(genre, _)| genre.to_string());

    let popularity: Vec<u32> = tracks.iter().filter_map(|t| t.popularity).collect();
    let average_popularity = (!popularity.is_empty())
        .then(|| popularity.iter().sum::<u32>() / popularity.len() as u32);

    let unique_artists = tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .map(|a| a.id.as_deref().unwrap_or(a.name.as_str()))
        .collect::<HashSet<_>>()
        .len();

    Insights {
        top_genre,
        average_popularity,
        unique_artists,
    }
}

fn print_insights(insights: &Insights, range: TimeRange) {
    let dim = Style::new().dim();
    println!("{}", style("Insights").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    match &insights.top_genre {
        Some(genre) => println!("  Listening leans toward {}.", style(genre).cyan()),
        None => println!("  {}", dim.apply_to("No genres for these artists.")),
    }
    if let Some(avg) = insights.average_popularity {
        println!("  Average track popularity is {}/100.", avg);
    }
    println!(
        "  {} unique artists across your {}.",
        insights.unique_artists,
        range.label().to_lowercase()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artist(name: &str, genres: &[&str]) -> Artist {
        serde_json::from_value(json!({ "id": name, "name": name, "genres": genres })).unwrap()
    }

    fn track(artists: &[&str], popularity: u32) -> Track {
        let artists: Vec<_> = artists.iter().map(|a| json!({ "id": a, "name": a })).collect();
        serde_json::from_value(json!({
            "name": "Song",
            "uri": "spotify:track:x",
            "popularity": popularity,
            "artists": artists
        }))
        .unwrap()
    }

    #[test]
    fn test_insights() {
        let artists = vec![
            artist("a", &["indie pop", "dream pop"]),
            artist("b", &["dream pop"]),
            artist("c", &["shoegaze"]),
        ];
        let tracks = vec![track(&["a"], 60), track(&["a", "b"], 80), track(&["c"], 70)];

        let insights = insights(&artists, &tracks);
        assert_eq!(insights.top_genre.as_deref(), Some("dream pop"));
        assert_eq!(insights.average_popularity, Some(70));
        assert_eq!(insights.unique_artists, 3);
    }

    #[test]
    fn test_insights_empty() {
        assert_eq!(insights(&[], &[]), Insights::default());
    }

    #[test]
    fn test_genre_ties_are_stable() {
        let artists = vec![artist("a", &["rock"]), artist("b", &["jazz"])];
        assert_eq!(insights(&artists, &[]).top_genre.as_deref(), Some("jazz"));
    }
}
