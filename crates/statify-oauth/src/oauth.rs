//! OAuth 2.0 PKCE primitives: provider configuration, verifier/challenge
//! generation, authorization URL building and redirect parsing.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{OAuthError, Result};

pub const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Scopes requested on login.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-email",
    "user-read-private",
    "user-top-read",
    "user-read-recently-played",
    "playlist-modify-private",
    "playlist-modify-public",
];

/// Tokens are treated as stale this long before they actually expire.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(60);

/// Default PKCE verifier length (RFC 7636 allows 43..=128).
pub const VERIFIER_LENGTH: usize = 64;

const STATE_LENGTH: usize = 16;

/// RFC 3986 unreserved characters.
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// OAuth provider configuration.
///
/// `client_id` and `redirect_uri` are supplied externally; when either is
/// missing the whole login flow is disabled (see [`OAuthConfig::has_config`]).
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub scopes: Vec<String>,
    pub refresh_skew: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::spotify()
    }
}

impl OAuthConfig {
    /// Spotify endpoints with no client credentials set.
    pub fn spotify() -> Self {
        Self {
            client_id: None,
            redirect_uri: None,
            authorize_url: SPOTIFY_AUTHORIZE_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            api_base_url: SPOTIFY_API_BASE_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            refresh_skew: DEFAULT_REFRESH_SKEW,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// True when both the client id and redirect URI are set and non-empty.
    pub fn has_config(&self) -> bool {
        self.credentials().is_ok()
    }

    /// The client id, or a configuration error.
    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                OAuthError::Configuration(
                    "missing Spotify client id (set STATIFY_CLIENT_ID or spotify.client_id)"
                        .to_string(),
                )
            })
    }

    /// The client id and redirect URI, or a configuration error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let client_id = self.require_client_id()?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                OAuthError::Configuration(
                    "missing redirect URI (set STATIFY_REDIRECT_URI or spotify.redirect_uri)"
                        .to_string(),
                )
            })?;
        Ok((client_id, redirect_uri))
    }

    /// Scopes joined the way the authorize endpoint expects them.
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Generate a PKCE code verifier of `length` unreserved characters.
///
/// Characters are drawn uniformly from the OS-seeded thread CSPRNG.
pub fn generate_verifier(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| UNRESERVED[rng.random_range(0..UNRESERVED.len())] as char)
        .collect()
}

/// Derive the S256 code challenge for a verifier.
pub fn derive_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    generate_verifier(STATE_LENGTH)
}

/// PKCE code verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair.
    pub fn generate() -> Self {
        let verifier = generate_verifier(VERIFIER_LENGTH);
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Build the authorization URL for the OAuth flow.
pub fn build_authorization_url(config: &OAuthConfig, challenge: &str, state: &str) -> Result<Url> {
    let (client_id, redirect_uri) = config.credentials()?;
    let mut url = Url::parse(&config.authorize_url)?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("scope", &config.scope_param())
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("state", state)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", challenge);
    Ok(url)
}

/// Query parameters the provider sends back to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl RedirectParams {
    /// Parse the callback URL the browser landed on.
    pub fn from_url(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim()).map_err(|e| {
            OAuthError::AuthExchange(format!("could not parse redirect URL: {}", e))
        })?;

        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(params)
    }

    /// Compare the returned state against the nonce sent on login.
    ///
    /// The session manager never calls this itself; collaborators that keep
    /// the nonce from [`crate::PendingLogin`] should.
    pub fn verify_state(&self, expected: &str) -> Result<()> {
        match self.state.as_deref() {
            Some(state) if state == expected => Ok(()),
            _ => Err(OAuthError::AuthExchange(
                "state mismatch, the redirect did not come from this login attempt".to_string(),
            )),
        }
    }

    /// The authorization code, or the provider's error.
    pub fn into_code(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(OAuthError::AuthExchange(format!(
                "authentication failed: {}",
                error
            )));
        }
        self.code.filter(|c| !c.is_empty()).ok_or_else(|| {
            OAuthError::AuthExchange("redirect did not include an authorization code".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> OAuthConfig {
        OAuthConfig::spotify()
            .with_client_id("client-123")
            .with_redirect_uri("http://127.0.0.1:8888/callback")
    }

    #[test]
    fn test_verifier_uses_unreserved_alphabet() {
        let verifier = generate_verifier(VERIFIER_LENGTH);
        assert_eq!(verifier.len(), 64);
        assert!(verifier.bytes().all(|b| UNRESERVED.contains(&b)));
    }

    #[test]
    fn test_verifiers_differ() {
        assert_ne!(generate_verifier(64), generate_verifier(64));
    }

    #[test]
    fn test_challenge_is_deterministic_and_url_safe() {
        let verifier = generate_verifier(VERIFIER_LENGTH);
        let a = derive_challenge(&verifier);
        let b = derive_challenge(&verifier);
        assert_eq!(a, b);
        assert!(!a.contains('+'));
        assert!(!a.contains('/'));
        assert!(!a.contains('='));
        // 32-byte digest, unpadded base64
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_challenge_rfc7636_vector() {
        assert_eq!(
            derive_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r7wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.challenge, derive_challenge(&pkce.verifier));
        assert_ne!(pkce.verifier, pkce.challenge);
    }

    #[test]
    fn test_state_generation() {
        let state1 = generate_state();
        let state2 = generate_state();
        assert_eq!(state1.len(), 16);
        assert_ne!(state1, state2);
    }

    #[test]
    fn test_authorization_url() {
        let url = build_authorization_url(&configured(), "test_challenge", "test_state").unwrap();

        assert!(url.as_str().starts_with("https://accounts.spotify.com/authorize?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("response_type").as_deref(), Some("code"));
        assert_eq!(get("client_id").as_deref(), Some("client-123"));
        assert_eq!(
            get("redirect_uri").as_deref(),
            Some("http://127.0.0.1:8888/callback")
        );
        assert_eq!(get("state").as_deref(), Some("test_state"));
        assert_eq!(get("code_challenge_method").as_deref(), Some("S256"));
        assert_eq!(get("code_challenge").as_deref(), Some("test_challenge"));
        assert!(get("scope").unwrap().contains("user-top-read user-read-recently-played"));
    }

    #[test]
    fn test_authorization_url_requires_credentials() {
        let err = build_authorization_url(&OAuthConfig::spotify(), "c", "s").unwrap_err();
        assert!(matches!(err, OAuthError::Configuration(_)));

        let blank = OAuthConfig::spotify()
            .with_client_id("  ")
            .with_redirect_uri("http://localhost/callback");
        assert!(!blank.has_config());
    }

    #[test]
    fn test_has_config() {
        assert!(!OAuthConfig::default().has_config());
        assert!(configured().has_config());
        assert!(
            !OAuthConfig::spotify()
                .with_client_id("client-123")
                .has_config()
        );
    }

    #[test]
    fn test_redirect_params_with_code() {
        let params =
            RedirectParams::from_url("http://127.0.0.1:8888/callback?code=abc123&state=xyz789")
                .unwrap();
        assert_eq!(params.state.as_deref(), Some("xyz789"));
        assert!(params.verify_state("xyz789").is_ok());
        assert!(params.verify_state("other").is_err());
        assert_eq!(params.into_code().unwrap(), "abc123");
    }

    #[test]
    fn test_redirect_params_with_error() {
        let params =
            RedirectParams::from_url("http://127.0.0.1:8888/callback?error=access_denied&state=s")
                .unwrap();
        let err = params.into_code().unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_redirect_params_invalid() {
        assert!(RedirectParams::from_url("not a url").is_err());
        let missing = RedirectParams::from_url("http://localhost/callback").unwrap();
        assert!(missing.verify_state("s").is_err());
        assert!(missing.into_code().is_err());
    }
}
