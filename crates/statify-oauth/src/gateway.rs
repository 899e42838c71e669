//! Authenticated resource-API calls with one bounded retry on 401.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{OAuthError, Result};
use crate::store::SessionStore;
use crate::token_manager::AccessTokenSupplier;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a header. An `Authorization` header set here is always replaced
    /// by the session's bearer token.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Executes resource-API requests on behalf of the current session.
#[derive(Debug)]
pub struct RequestGateway {
    api_base: Url,
    supplier: Arc<AccessTokenSupplier>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
}

impl RequestGateway {
    pub fn new(
        api_base: Url,
        supplier: Arc<AccessTokenSupplier>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            api_base,
            supplier,
            transport,
            store,
        }
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Build the full URL for an API path such as `/me/top/tracks`.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let base = self.api_base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Execute a request and decode the JSON response.
    ///
    /// A 401 triggers exactly one forced refresh and one retry. A second 401
    /// ends the session with [`OAuthError::SessionExpired`]; no further
    /// requests are made.
    pub async fn execute<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        let token = self
            .supplier
            .ensure_access_token()
            .await?
            .ok_or(OAuthError::SessionRequired)?;
        let url = self.url(path, &options.query)?;

        let mut response = self.send(&url, &options, &token).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            tracing::debug!(path, "Resource API returned 401, forcing token refresh");
            let token = self.supplier.force_refresh(&token).await?;
            response = self.send(&url, &options, &token).await?;

            if response.status == StatusCode::UNAUTHORIZED {
                tracing::warn!(path, "Resource API still returned 401 after refresh, ending session");
                if let Err(e) = self.store.clear().await {
                    tracing::error!(error = %e, "Failed to clear expired session");
                }
                return Err(OAuthError::SessionExpired);
            }
        }

        if !response.is_success() {
            return Err(request_failed(&response));
        }
        response.json()
    }

    async fn send(&self, url: &Url, options: &RequestOptions, token: &str) -> Result<HttpResponse> {
        let mut headers = options.headers.clone();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            OAuthError::AuthExchange("access token is not a valid header value".to_string())
        })?;
        headers.insert(header::AUTHORIZATION, bearer);

        let request = HttpRequest {
            method: options.method.clone(),
            url: url.clone(),
            headers,
            body: options
                .body
                .clone()
                .map(RequestBody::Json)
                .unwrap_or_default(),
        };

        let response = self.transport.send(request).await?;
        tracing::debug!(method = %options.method, url = %url.path(), status = %response.status, "Resource API response");
        Ok(response)
    }
}

/// Map a non-2xx resource response to [`OAuthError::RequestFailed`].
fn request_failed(response: &HttpResponse) -> OAuthError {
    let payload = response.json_value();
    let message = payload
        .as_ref()
        .and_then(|p| {
            p.pointer("/error/message")
                .and_then(|m| m.as_str())
                .or_else(|| p.get("error_description").and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| "Spotify request failed".to_string());

    OAuthError::RequestFailed {
        status: response.status.as_u16(),
        message,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::TokenExchangeClient;
    use crate::oauth::DEFAULT_REFRESH_SKEW;
    use crate::store::{MemorySessionStore, TokenRecord};
    use crate::testing::{ScriptedTransport, T0_SECS, configured, start_clock, token_json};

    struct Fixture {
        store: Arc<MemorySessionStore>,
        transport: Arc<ScriptedTransport>,
        gateway: RequestGateway,
    }

    fn fixture(store: MemorySessionStore) -> Fixture {
        let store = Arc::new(store);
        let transport = Arc::new(ScriptedTransport::new());
        let clock = Arc::new(start_clock());
        let config = Arc::new(configured());
        let exchange = Arc::new(TokenExchangeClient::new(
            config.clone(),
            store.clone(),
            transport.clone(),
            clock.clone(),
        ));
        let supplier = Arc::new(AccessTokenSupplier::new(
            store.clone(),
            exchange,
            clock,
            DEFAULT_REFRESH_SKEW,
        ));
        let gateway = RequestGateway::new(
            Url::parse(&config.api_base_url).unwrap(),
            supplier,
            transport.clone(),
            store.clone(),
        );
        Fixture {
            store,
            transport,
            gateway,
        }
    }

    fn active_session() -> MemorySessionStore {
        MemorySessionStore::with_record(&TokenRecord {
            access_token: "token-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            scope: "user-top-read".to_string(),
            expires_at: (T0_SECS + 3600) * 1000,
        })
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let f = fixture(MemorySessionStore::new());
        let url = f.gateway.url("/me", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/me");

        let url = f
            .gateway
            .url(
                "me/top/artists",
                &[
                    ("time_range".to_string(), "short_term".to_string()),
                    ("limit".to_string(), "10".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.spotify.com/v1/me/top/artists?time_range=short_term&limit=10"
        );
    }

    #[tokio::test]
    async fn test_no_session_fails_before_network() {
        let f = fixture(MemorySessionStore::new());
        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::SessionRequired));
        assert_eq!(f.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_bearer_header_wins_over_caller() {
        let f = fixture(active_session());
        f.transport
            .push_json(StatusCode::OK, serde_json::json!({ "id": "user-1" }));

        let options = RequestOptions::get()
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer spoofed"))
            .header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        let profile: serde_json::Value = f.gateway.execute("/me", options).await.unwrap();
        assert_eq!(profile["id"], "user-1");

        let sent = f.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer_token(), Some("token-1"));
        assert_eq!(sent[0].headers.get_all(header::AUTHORIZATION).iter().count(), 1);
        assert_eq!(sent[0].headers[header::ACCEPT_LANGUAGE], "en");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let f = fixture(active_session());
        f.transport
            .push_json(StatusCode::CREATED, serde_json::json!({ "snapshot_id": "s1" }));

        let body = serde_json::json!({ "uris": ["spotify:track:1"] });
        let _: serde_json::Value = f
            .gateway
            .execute("/playlists/p1/tracks", RequestOptions::post_json(body.clone()))
            .await
            .unwrap();

        let sent = f.transport.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].body, RequestBody::Json(body));
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let f = fixture(active_session());
        f.transport.push_status(StatusCode::UNAUTHORIZED);
        f.transport
            .push_json(StatusCode::OK, token_json("token-2", None, 3600));
        f.transport
            .push_json(StatusCode::OK, serde_json::json!({ "id": "user-1" }));

        let profile: serde_json::Value = f
            .gateway
            .execute("/me", RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(profile["id"], "user-1");

        let sent = f.transport.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].bearer_token(), Some("token-1"));
        assert_eq!(sent[1].form_value("grant_type"), Some("refresh_token"));
        assert_eq!(sent[2].bearer_token(), Some("token-2"));
        assert_eq!(sent[2].url, sent[0].url);
    }

    #[tokio::test]
    async fn test_second_401_expires_session() {
        let f = fixture(active_session());
        f.transport.push_status(StatusCode::UNAUTHORIZED);
        f.transport
            .push_json(StatusCode::OK, token_json("token-2", None, 3600));
        f.transport.push_status(StatusCode::UNAUTHORIZED);

        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::SessionExpired));
        assert_eq!(f.transport.request_count(), 3);
        assert_eq!(f.transport.token_requests(), 1);
        assert!(f.store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_forced_refresh_expires_session() {
        let f = fixture(active_session());
        f.transport.push_status(StatusCode::UNAUTHORIZED);
        f.transport.push_json(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "invalid_grant" }),
        );

        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::SessionExpired));
        assert_eq!(f.transport.request_count(), 2);
        assert!(f.store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_structured_error_payload() {
        let f = fixture(active_session());
        f.transport.push_json(
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({ "error": { "status": 429, "message": "API rate limit exceeded" } }),
        );

        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        match err {
            OAuthError::RequestFailed {
                status,
                message,
                payload,
            } => {
                assert_eq!(status, 429);
                assert_eq!(message, "API rate limit exceeded");
                assert_eq!(payload.unwrap()["error"]["status"], 429);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Not session-fatal.
        assert!(f.store.load().await.is_some());
        assert_eq!(f.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_error_gets_generic_message() {
        let f = fixture(active_session());
        f.transport.push_status(StatusCode::BAD_GATEWAY);

        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OAuthError::RequestFailed { status: 502, ref message, payload: None }
                if message == "Spotify request failed"
        ));
    }

    #[tokio::test]
    async fn test_retry_failure_other_than_401() {
        let f = fixture(active_session());
        f.transport.push_status(StatusCode::UNAUTHORIZED);
        f.transport
            .push_json(StatusCode::OK, token_json("token-2", None, 3600));
        f.transport.push_json(
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error_description": "Insufficient client scope" }),
        );

        let err = f
            .gateway
            .execute::<serde_json::Value>("/me", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OAuthError::RequestFailed { status: 403, ref message, .. }
                if message == "Insufficient client scope"
        ));
        assert!(f.store.load().await.is_some());
    }
}
