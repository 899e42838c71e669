//! API endpoint implementations.

mod player;
mod playlists;
mod profile;
mod top;

pub use player::{PlayerApi, RecentlyPlayedQuery};
pub use playlists::{MAX_TRACKS_PER_REQUEST, PlaylistsApi};
pub use profile::ProfileApi;
pub use top::{DEFAULT_LIMIT, MAX_LIMIT, TopApi, TopItemsQuery};

/// Spotify accepts page sizes between 1 and 50.
pub(crate) fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}
