//! Main client implementation.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use statify_oauth::{RequestOptions, SessionManager};

use crate::api::{PlayerApi, PlaylistsApi, ProfileApi, TopApi};
use crate::error::{Error, Result};
use crate::types::{
    CreatePlaylistRequest, CursorPaging, NewPlaylist, Paging, PlayHistory, Playlist, TimeRange,
    TopItemKind, UserProfile,
};

/// Typed Spotify Web API client.
///
/// Every call goes through the session manager, so tokens are refreshed as
/// needed and a revoked token gets one retry.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use statify_client::{SpotifyClient, TimeRange};
/// use statify_oauth::{OAuthConfig, SessionManager};
///
/// # async fn example() -> statify_client::Result<()> {
/// let session = SessionManager::builder(OAuthConfig::spotify().with_client_id("id")).build()?;
/// let client = SpotifyClient::new(Arc::new(session));
///
/// let me = client.profile().await?;
/// let tracks = client.top().tracks(TimeRange::ShortTerm, 5).await?;
/// println!("{} has {} top tracks", me.name(), tracks.items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    session: Arc<SessionManager>,
}

impl SpotifyClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// The session manager behind this client.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the current user's profile API.
    pub fn me(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    /// Access the top artists/tracks API.
    pub fn top(&self) -> TopApi {
        TopApi::new(self.clone())
    }

    /// Access the player (listening history) API.
    pub fn player(&self) -> PlayerApi {
        PlayerApi::new(self.clone())
    }

    /// Access the playlists API.
    pub fn playlists(&self) -> PlaylistsApi {
        PlaylistsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shortcuts
    // ─────────────────────────────────────────────────────────────────────────

    /// The current user's profile.
    pub async fn profile(&self) -> Result<UserProfile> {
        self.me().get().await
    }

    /// The user's top artists or tracks, as raw JSON items.
    pub async fn top_items(
        &self,
        kind: TopItemKind,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Paging<serde_json::Value>> {
        self.top().items(kind, time_range, limit).await
    }

    /// The most recently played tracks.
    pub async fn recently_played(&self, limit: u32) -> Result<CursorPaging<PlayHistory>> {
        self.player().recently_played(limit).await
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        request: CreatePlaylistRequest,
    ) -> Result<Playlist> {
        self.playlists().create(user_id, request).await
    }

    /// Append tracks to a playlist, returning the final snapshot id.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<String>> {
        self.playlists().add_tracks(playlist_id, uris).await
    }

    pub async fn create_playlist_with_tracks(
        &self,
        user_id: &str,
        playlist: NewPlaylist,
    ) -> Result<Playlist> {
        self.playlists().create_with_tracks(user_id, playlist).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Make a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.session.execute(path, RequestOptions::get()).await?)
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut options = RequestOptions::get();
        for (key, value) in query_pairs(query)? {
            options = options.query(key, value);
        }
        Ok(self.session.execute(path, options).await?)
    }

    /// Make a POST request with a JSON body.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        Ok(self.session.execute(path, RequestOptions::post_json(body)).await?)
    }
}

/// Flatten a serializable struct into query pairs, skipping `None` fields.
fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(query)?;
    let serde_json::Value::Object(map) = value else {
        return Err(Error::InvalidRequest(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Query {
        limit: u32,
        time_range: TimeRange,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<u32>,
        before: Option<i64>,
    }

    #[test]
    fn test_query_pairs_flatten_values() {
        let mut pairs = query_pairs(&Query {
            limit: 10,
            time_range: TimeRange::ShortTerm,
            offset: None,
            before: None,
        })
        .unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("time_range".to_string(), "short_term".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_reject_scalars() {
        assert!(matches!(query_pairs(&5), Err(Error::InvalidRequest(_))));
    }
}
