//! Shared fakes for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::Mutex;
use reqwest::StatusCode;
use url::Url;

use crate::clock::ManualClock;
use crate::error::{OAuthError, Result};
use crate::oauth::OAuthConfig;
use crate::session::Navigator;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

pub(crate) const T0_SECS: i64 = 1_700_000_000;

pub(crate) fn configured() -> OAuthConfig {
    OAuthConfig::spotify()
        .with_client_id("client-123")
        .with_redirect_uri("http://127.0.0.1:8888/callback")
}

pub(crate) fn start_clock() -> ManualClock {
    ManualClock::new(DateTime::from_timestamp(T0_SECS, 0).expect("valid timestamp"))
}

pub(crate) fn token_json(access: &str, refresh: Option<&str>, expires_in: i64) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "user-top-read",
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    body
}

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Transport that replays queued responses, then falls back to a handler.
pub(crate) struct ScriptedTransport {
    queue: Mutex<VecDeque<std::result::Result<HttpResponse, String>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("queued", &self.queue.lock().len())
            .finish()
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_handler(
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    pub(crate) fn push_json(&self, status: StatusCode, body: serde_json::Value) {
        self.queue
            .lock()
            .push_back(Ok(HttpResponse::json_body(status, &body)));
    }

    pub(crate) fn push_status(&self, status: StatusCode) {
        self.queue.lock().push_back(Ok(HttpResponse::new(status, Vec::new())));
    }

    pub(crate) fn push_network_error(&self, message: &str) {
        self.queue.lock().push_back(Err(message.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests sent to the token endpoint.
    pub(crate) fn token_requests(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.path() == "/api/token")
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        // Let concurrently started callers run before this one completes.
        tokio::task::yield_now().await;

        let queued = self.queue.lock().pop_front();
        match queued {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(OAuthError::Network(message)),
            None => match &self.handler {
                Some(handler) => Ok(handler(&request)),
                None => Err(OAuthError::Network(format!(
                    "no scripted response for {}",
                    request.url
                ))),
            },
        }
    }
}

/// Navigator that records where it was sent.
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    visited: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub(crate) fn visited(&self) -> Vec<Url> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) -> Result<()> {
        self.visited.lock().push(url.clone());
        Ok(())
    }
}
