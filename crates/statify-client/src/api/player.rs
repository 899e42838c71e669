//! Listening history API.

use super::clamp_limit;
use super::top::DEFAULT_LIMIT;
use crate::client::SpotifyClient;
use crate::error::Result;
use crate::types::{CursorPaging, PlayHistory};

/// Query parameters for the play history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecentlyPlayedQuery {
    pub limit: u32,
    /// Unix millis; only items played before this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    /// Unix millis; only items played after this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

impl Default for RecentlyPlayedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            before: None,
            after: None,
        }
    }
}

/// Player API client.
pub struct PlayerApi {
    client: SpotifyClient,
}

impl PlayerApi {
    pub(crate) fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// The most recently played tracks.
    pub async fn recently_played(&self, limit: u32) -> Result<CursorPaging<PlayHistory>> {
        self.recently_played_with_query(RecentlyPlayedQuery {
            limit,
            ..Default::default()
        })
        .await
    }

    pub async fn recently_played_with_query(
        &self,
        mut query: RecentlyPlayedQuery,
    ) -> Result<CursorPaging<PlayHistory>> {
        query.limit = clamp_limit(query.limit);
        self.client
            .get_with_query("/me/player/recently-played", &query)
            .await
    }
}
