//! Top artists and tracks API.

use serde::de::DeserializeOwned;

use super::clamp_limit;
use crate::client::SpotifyClient;
use crate::error::Result;
use crate::types::{Artist, Paging, TimeRange, TopItemKind, Track};

/// Number of items returned when the caller has no preference.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page Spotify serves.
pub const MAX_LIMIT: u32 = 50;

/// Query parameters for top items.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopItemsQuery {
    pub time_range: TimeRange,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl Default for TopItemsQuery {
    fn default() -> Self {
        Self {
            time_range: TimeRange::default(),
            limit: DEFAULT_LIMIT,
            offset: None,
        }
    }
}

/// Top items API client.
pub struct TopApi {
    client: SpotifyClient,
}

impl TopApi {
    pub(crate) fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// Top items of the given kind, deserialized into `T`.
    pub async fn items<T: DeserializeOwned>(
        &self,
        kind: TopItemKind,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Paging<T>> {
        self.items_with_query(
            kind,
            TopItemsQuery {
                time_range,
                limit,
                offset: None,
            },
        )
        .await
    }

    /// Top items with full query control.
    pub async fn items_with_query<T: DeserializeOwned>(
        &self,
        kind: TopItemKind,
        mut query: TopItemsQuery,
    ) -> Result<Paging<T>> {
        query.limit = clamp_limit(query.limit);
        self.client
            .get_with_query(&format!("/me/top/{}", kind.as_str()), &query)
            .await
    }

    /// The user's top artists.
    pub async fn artists(&self, time_range: TimeRange, limit: u32) -> Result<Paging<Artist>> {
        self.items(TopItemKind::Artists, time_range, limit).await
    }

    /// The user's top tracks.
    pub async fn tracks(&self, time_range: TimeRange, limit: u32) -> Result<Paging<Track>> {
        self.items(TopItemKind::Tracks, time_range, limit).await
    }
}
