//! Typed Spotify Web API client for Statify.
//!
//! Wraps [`statify_oauth::SessionManager`] so every call carries a fresh
//! bearer token and survives one token revocation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use statify_client::{NewPlaylist, SpotifyClient, TimeRange};
//! use statify_oauth::{OAuthConfig, SessionManager};
//!
//! # async fn example() -> statify_client::Result<()> {
//! let session = SessionManager::builder(OAuthConfig::spotify().with_client_id("id")).build()?;
//! let client = SpotifyClient::new(Arc::new(session));
//!
//! let me = client.profile().await?;
//! let top = client.top().tracks(TimeRange::ShortTerm, 20).await?;
//! let playlist = client
//!     .create_playlist_with_tracks(
//!         &me.id,
//!         NewPlaylist {
//!             name: "Statify • Last 4 Weeks".into(),
//!             track_uris: top.items.iter().map(|t| t.uri.clone()).collect(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! println!("{:?}", playlist.external_urls.spotify);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Profile**: `GET /me`
//! - **Top items**: `GET /me/top/{artists|tracks}`
//! - **Player**: `GET /me/player/recently-played`
//! - **Playlists**: create, add tracks (batched)

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{RecentlyPlayedQuery, TopItemsQuery};
pub use client::SpotifyClient;
pub use error::{Error, Result};
pub use types::*;
