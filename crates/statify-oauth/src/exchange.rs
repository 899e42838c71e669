//! Token endpoint client for the authorization-code and refresh grants.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::clock::Clock;
use crate::error::{OAuthError, Result};
use crate::oauth::OAuthConfig;
use crate::store::{SessionStore, TokenRecord};
use crate::transport::{HttpRequest, HttpTransport};

/// Lifetime assumed when the provider does not send `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn message(self) -> String {
        self.error_description
            .filter(|s| !s.is_empty())
            .or(self.error.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "Spotify token endpoint error".to_string())
    }
}

/// Talks to the token endpoint and persists what it returns.
#[derive(Debug)]
pub struct TokenExchangeClient {
    config: Arc<OAuthConfig>,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
}

impl TokenExchangeClient {
    pub fn new(
        config: Arc<OAuthConfig>,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            clock,
        }
    }

    /// Trade an authorization code for tokens.
    ///
    /// Needs the verifier saved by the login that produced `code`. The
    /// verifier is discarded once the exchange succeeds; a code can only be
    /// redeemed once.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<TokenRecord> {
        let (client_id, redirect_uri) = self.config.credentials()?;
        let verifier = self.store.load_verifier().await.ok_or_else(|| {
            OAuthError::AuthExchange(
                "missing code verifier, start the Spotify login again".to_string(),
            )
        })?;

        let response = self
            .request_token(vec![
                ("grant_type".to_string(), "authorization_code".to_string()),
                ("code".to_string(), code.to_string()),
                ("redirect_uri".to_string(), redirect_uri.to_string()),
                ("code_verifier".to_string(), verifier),
                ("client_id".to_string(), client_id.to_string()),
            ])
            .await?;

        let previous = self.store.load().await.and_then(|r| r.refresh_token);
        let record = self.build_record(response, previous)?;
        self.store.save(&record).await?;
        self.store.clear_verifier().await?;

        tracing::info!(scope = %record.scope, "Authorization code exchanged");
        Ok(record)
    }

    /// Mint a new access token from a refresh token.
    ///
    /// Providers that do not rotate refresh tokens omit one from the
    /// response; the token passed in is kept in that case.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord> {
        if refresh_token.is_empty() {
            return Err(OAuthError::AuthExchange(
                "missing refresh token".to_string(),
            ));
        }
        let client_id = self.config.require_client_id()?;

        let response = self
            .request_token(vec![
                ("grant_type".to_string(), "refresh_token".to_string()),
                ("refresh_token".to_string(), refresh_token.to_string()),
                ("client_id".to_string(), client_id.to_string()),
            ])
            .await?;

        let record = self.build_record(response, Some(refresh_token.to_string()))?;
        self.store.save(&record).await?;

        tracing::info!("Access token refreshed");
        Ok(record)
    }

    async fn request_token(&self, params: Vec<(String, String)>) -> Result<TokenResponse> {
        let url = Url::parse(&self.config.token_url)?;
        let response = self.transport.send(HttpRequest::form(url, params)).await?;

        if !response.is_success() {
            let detail: TokenErrorResponse = serde_json::from_slice(&response.body)
                .unwrap_or_default();
            let message = detail.message();
            tracing::warn!(status = %response.status, %message, "Token endpoint rejected request");
            return Err(OAuthError::AuthExchange(message));
        }

        response.json().map_err(|e| {
            OAuthError::AuthExchange(format!("failed to parse token response: {}", e))
        })
    }

    fn build_record(
        &self,
        response: TokenResponse,
        fallback_refresh: Option<String>,
    ) -> Result<TokenRecord> {
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = Some(expires_in)
            .filter(|secs| *secs >= 0)
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(|ms| self.clock.now_millis().checked_add(ms))
            .ok_or_else(|| {
                tracing::warn!(expires_in, "Token endpoint sent an unusable expires_in");
                OAuthError::AuthExchange("invalid expires_in".to_string())
            })?;

        Ok(TokenRecord {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .or(fallback_refresh),
            scope: response.scope.unwrap_or_default(),
            expires_at,
        })
    }
}
