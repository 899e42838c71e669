//! Playlists API.

use crate::client::SpotifyClient;
use crate::error::{Error, Result};
use crate::types::{
    AddTracksRequest, CreatePlaylistRequest, NewPlaylist, Playlist, SnapshotResponse,
};

/// Spotify rejects more than 100 URIs in one add request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Playlists API client.
pub struct PlaylistsApi {
    client: SpotifyClient,
}

impl PlaylistsApi {
    pub(crate) fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// Create an empty playlist owned by `user_id`.
    pub async fn create(&self, user_id: &str, request: CreatePlaylistRequest) -> Result<Playlist> {
        let playlist: Playlist = self
            .client
            .post(
                &format!("/users/{}/playlists", urlencoding::encode(user_id)),
                &request,
            )
            .await?;
        tracing::info!(playlist_id = %playlist.id, "Created playlist");
        Ok(playlist)
    }

    /// Append tracks, batching requests. Returns the last snapshot id, or
    /// `None` when `uris` is empty.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<Option<String>> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let mut snapshot = None;

        for chunk in uris.chunks(MAX_TRACKS_PER_REQUEST) {
            let response: SnapshotResponse = self
                .client
                .post(&path, &AddTracksRequest { uris: chunk })
                .await?;
            tracing::debug!(count = chunk.len(), "Added tracks to playlist");
            snapshot = Some(response.snapshot_id);
        }

        Ok(snapshot)
    }

    /// Create a playlist and fill it with `playlist.track_uris`.
    ///
    /// An empty URI list is rejected before anything is created.
    pub async fn create_with_tracks(&self, user_id: &str, playlist: NewPlaylist) -> Result<Playlist> {
        if playlist.track_uris.is_empty() {
            return Err(Error::InvalidRequest(
                "a playlist needs at least one track".to_string(),
            ));
        }

        let request = CreatePlaylistRequest {
            name: playlist.name,
            description: playlist.description,
            public: playlist.public,
        };
        let mut created = self.create(user_id, request).await?;
        if let Some(snapshot) = self.add_tracks(&created.id, &playlist.track_uris).await? {
            created.snapshot_id = Some(snapshot);
        }
        Ok(created)
    }
}
