//! OAuth 2.0 Authorization Code + PKCE session manager for the Spotify Web API.
//!
//! Authenticates a user, keeps their tokens fresh and wraps authenticated
//! resource calls with a bounded retry policy.
//!
//! # Components
//!
//! - [`oauth`] — PKCE verifier/challenge, state nonce, authorize URL, redirect parsing
//! - [`store`] — Token record persistence and the single-slot PKCE verifier
//! - [`exchange`] — Token endpoint client (authorization code and refresh grants)
//! - [`token_manager`] — Expiry checks and single-flight refresh
//! - [`gateway`] — Bearer-authenticated requests with one retry on 401
//! - [`session`] — [`SessionManager`], the façade collaborators use
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use statify_oauth::{FileSessionStore, OAuthConfig, RequestOptions, SessionManager};
//!
//! # async fn example() -> statify_oauth::Result<()> {
//! let config = OAuthConfig::spotify()
//!     .with_client_id("my-client-id")
//!     .with_redirect_uri("http://127.0.0.1:8888/callback");
//! let manager = SessionManager::builder(config)
//!     .store(Arc::new(FileSessionStore::new(std::path::Path::new("/tmp/statify"))))
//!     .build()?;
//!
//! if manager.ensure_access_token().await?.is_none() {
//!     let pending = manager.initiate_login().await?;
//!     println!("Log in at {}", pending.url);
//!     return Ok(());
//! }
//!
//! let me: serde_json::Value = manager.execute("/me", RequestOptions::get()).await?;
//! println!("{}", me["display_name"]);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod exchange;
pub mod gateway;
pub mod oauth;
pub mod session;
pub mod store;
pub mod token_manager;
pub mod transport;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{OAuthError, Result};
pub use gateway::RequestOptions;
pub use oauth::{OAuthConfig, PkceChallenge, RedirectParams, derive_challenge, generate_verifier};
pub use session::{
    Navigator, NoopNavigator, PendingLogin, SessionManager, SessionManagerBuilder, SessionState,
};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, TokenRecord};
pub use token_manager::{AccessTokenSupplier, TokenInfo};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody};
