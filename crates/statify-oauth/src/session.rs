//! The session manager: the single entry point collaborators talk to.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::error::{OAuthError, Result};
use crate::exchange::TokenExchangeClient;
use crate::gateway::{RequestGateway, RequestOptions};
use crate::oauth::{
    OAuthConfig, RedirectParams, VERIFIER_LENGTH, build_authorization_url, derive_challenge,
    generate_state, generate_verifier,
};
use crate::store::{MemorySessionStore, SessionStore, TokenRecord};
use crate::token_manager::{AccessTokenSupplier, TokenInfo};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Sends the user agent to the authorize URL.
///
/// In a browser this is a full-page navigation; a CLI opens the system
/// browser. Navigation ends the current login step: the flow resumes when
/// the provider redirects back with a code.
pub trait Navigator: Send + Sync + std::fmt::Debug {
    fn navigate(&self, url: &Url) -> Result<()>;
}

/// Navigator that does nothing; the caller uses [`PendingLogin::url`] itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _url: &Url) -> Result<()> {
        Ok(())
    }
}

/// A login that has been started but not yet exchanged.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// The authorize URL the user was sent to.
    pub url: Url,
    /// The state nonce sent with it. The manager does not check it on
    /// return; see [`RedirectParams::verify_state`].
    pub state: String,
}

/// Session state derived from storage, the clock and in-flight refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    /// A verifier is waiting for the provider's redirect.
    PendingExchange,
    /// A token is stored and usable. This includes a token inside the skew
    /// window that still has a refresh token: it is refreshed on next use,
    /// so it is not reported as fresh by [`TokenInfo::is_expired`] either.
    Active,
    Refreshing,
    /// Stale with no way to refresh. Only a new login recovers.
    Expired,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::NoSession => "no session",
            SessionState::PendingExchange => "pending exchange",
            SessionState::Active => "active",
            SessionState::Refreshing => "refreshing",
            SessionState::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// OAuth session manager.
///
/// Constructed once with its storage, transport, navigator and clock. All
/// token handling goes through it; collaborators never touch the store.
#[derive(Debug)]
pub struct SessionManager {
    config: Arc<OAuthConfig>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    exchange: Arc<TokenExchangeClient>,
    supplier: Arc<AccessTokenSupplier>,
    gateway: RequestGateway,
}

impl SessionManager {
    pub fn builder(config: OAuthConfig) -> SessionManagerBuilder {
        SessionManagerBuilder::new(config)
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Whether the client id and redirect URI are configured. Login
    /// affordances should only be offered when this is true.
    pub fn has_config(&self) -> bool {
        self.config.has_config()
    }

    /// Start a login and navigate to the provider.
    ///
    /// Any unfinished earlier login is discarded: its verifier is
    /// overwritten and its code can no longer be exchanged. Without a client
    /// id or redirect URI this fails before touching storage or navigating.
    pub async fn initiate_login(&self) -> Result<PendingLogin> {
        self.config.credentials()?;

        let verifier = generate_verifier(VERIFIER_LENGTH);
        let challenge = derive_challenge(&verifier);
        let state = generate_state();
        let url = build_authorization_url(&self.config, &challenge, &state)?;

        self.store.save_verifier(&verifier).await?;
        tracing::info!("Starting Spotify login");
        self.navigator.navigate(&url)?;

        Ok(PendingLogin { url, state })
    }

    /// Exchange the code from the provider's redirect for tokens.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<TokenRecord> {
        self.exchange.exchange_authorization_code(code).await
    }

    /// Finish a login from the redirect parameters.
    ///
    /// A provider error in the redirect surfaces as
    /// [`OAuthError::AuthExchange`]. The state nonce is not checked here.
    pub async fn complete_login(&self, redirect: RedirectParams) -> Result<TokenRecord> {
        let code = redirect.into_code()?;
        self.exchange_authorization_code(&code).await
    }

    /// A valid access token, or `None` when the user must log in.
    pub async fn ensure_access_token(&self) -> Result<Option<String>> {
        self.supplier.ensure_access_token().await
    }

    /// Execute an authenticated resource-API request.
    pub async fn execute<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.gateway.execute(path, options).await
    }

    /// Log out: drop the stored tokens and any pending verifier.
    pub async fn clear_session(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("Session cleared");
        Ok(())
    }

    pub async fn session_state(&self) -> SessionState {
        if self.supplier.is_refreshing() {
            return SessionState::Refreshing;
        }
        match self.store.load().await {
            Some(record) if !self.supplier.is_stale(&record) => SessionState::Active,
            Some(record) if record.refresh_token().is_some() => SessionState::Active,
            Some(_) => SessionState::Expired,
            None if self.store.load_verifier().await.is_some() => SessionState::PendingExchange,
            None => SessionState::NoSession,
        }
    }

    pub async fn token_info(&self) -> Option<TokenInfo> {
        self.supplier.token_info().await
    }
}

/// Builder for [`SessionManager`].
#[derive(Debug)]
pub struct SessionManagerBuilder {
    config: OAuthConfig,
    store: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionManagerBuilder {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            store: None,
            transport: None,
            navigator: None,
            clock: None,
        }
    }

    /// Session storage. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// HTTP transport. Defaults to reqwest.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Navigator for login. Defaults to [`NoopNavigator`].
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Clock. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SessionManager> {
        let api_base = Url::parse(&self.config.api_base_url).map_err(|e| {
            OAuthError::Configuration(format!(
                "invalid API base URL '{}': {}",
                self.config.api_base_url, e
            ))
        })?;

        let config = Arc::new(self.config);
        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemorySessionStore::new()),
        };
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()),
        };
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(NoopNavigator),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let exchange = Arc::new(TokenExchangeClient::new(
            config.clone(),
            store.clone(),
            transport.clone(),
            clock.clone(),
        ));
        let supplier = Arc::new(AccessTokenSupplier::new(
            store.clone(),
            exchange.clone(),
            clock,
            config.refresh_skew,
        ));
        let gateway = RequestGateway::new(api_base, supplier.clone(), transport, store.clone());

        Ok(SessionManager {
            config,
            store,
            navigator,
            exchange,
            supplier,
            gateway,
        })
    }
}
