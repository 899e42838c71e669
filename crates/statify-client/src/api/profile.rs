//! Current user profile API.

use crate::client::SpotifyClient;
use crate::error::Result;
use crate::types::UserProfile;

/// Profile API client.
pub struct ProfileApi {
    client: SpotifyClient,
}

impl ProfileApi {
    pub(crate) fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// Get the profile of the logged in user.
    pub async fn get(&self) -> Result<UserProfile> {
        self.client.get("/me").await
    }
}
