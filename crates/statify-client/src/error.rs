//! Client error types.

use statify_oauth::OAuthError;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The user has to log in (again) before the call can succeed.
    #[error("Login required")]
    LoginRequired(#[source] OAuthError),

    /// Session machinery failed (network, storage, configuration).
    #[error(transparent)]
    Session(OAuthError),

    /// Spotify returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from Spotify.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request was rejected before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if the user must log in to continue.
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::LoginRequired(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }
}

impl From<OAuthError> for Error {
    fn from(err: OAuthError) -> Self {
        match err {
            err if err.requires_login() => Error::LoginRequired(err),
            OAuthError::RequestFailed {
                status: 404,
                message,
                ..
            } => Error::NotFound(message),
            OAuthError::RequestFailed {
                status, message, ..
            } => Error::Api { status, message },
            other => Error::Session(other),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
