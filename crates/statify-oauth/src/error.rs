//! Error types for the session manager.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while authenticating or calling the resource API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// Client id or redirect URI is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The token endpoint rejected a code or refresh token.
    ///
    /// Carries the provider's error text verbatim when it supplied one.
    #[error("Authorization failed: {0}")]
    AuthExchange(String),

    /// An authenticated call was attempted with no session.
    #[error("No active session. Log in to continue.")]
    SessionRequired,

    /// The resource API kept answering 401 after a forced refresh and retry.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// The resource API returned a non-2xx status other than a recoverable 401.
    #[error("Request failed ({status}): {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Provider message, or a generic one when the body was not parseable.
        message: String,
        /// Structured error payload when the body was JSON.
        payload: Option<serde_json::Value>,
    },

    /// Network/transport error.
    #[error("Network error: {0}")]
    Network(String),

    /// Session storage could not be written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OAuthError {
    /// Whether this error means the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            OAuthError::SessionRequired | OAuthError::SessionExpired | OAuthError::AuthExchange(_)
        )
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for OAuthError {
    fn from(e: serde_json::Error) -> Self {
        OAuthError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for OAuthError {
    fn from(e: url::ParseError) -> Self {
        OAuthError::Configuration(format!("invalid URL: {}", e))
    }
}
