//! Access token supply: expiry checks and single-flight refresh.
//!
//! Every call re-reads the store; there is no cache beyond it. Refreshes run
//! one at a time behind an async guard. A caller that had to wait for the
//! guard picks up the outcome of the refresh it waited on: the token the
//! previous holder just minted, or the error that refresh failed with.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::{OAuthError, Result};
use crate::exchange::TokenExchangeClient;
use crate::store::{SessionStore, TokenRecord};

/// Outcome of the most recent refresh, kept under the refresh guard.
#[derive(Debug, Default)]
struct RefreshSlot {
    /// Error of the latest refresh and the generation it completed as.
    last_failure: Option<(u64, OAuthError)>,
}

/// Decides when stored tokens must be refreshed and does it.
#[derive(Debug)]
pub struct AccessTokenSupplier {
    store: Arc<dyn SessionStore>,
    exchange: Arc<TokenExchangeClient>,
    clock: Arc<dyn Clock>,
    skew_ms: i64,
    /// Number of refreshes that have completed, successful or not.
    generation: AtomicU64,
    refresh_guard: Mutex<RefreshSlot>,
}

impl AccessTokenSupplier {
    pub fn new(
        store: Arc<dyn SessionStore>,
        exchange: Arc<TokenExchangeClient>,
        clock: Arc<dyn Clock>,
        skew: std::time::Duration,
    ) -> Self {
        Self {
            store,
            exchange,
            clock,
            skew_ms: i64::try_from(skew.as_millis()).unwrap_or(i64::MAX),
            generation: AtomicU64::new(0),
            refresh_guard: Mutex::new(RefreshSlot::default()),
        }
    }

    /// Whether `record` is within the skew window of its expiry (or past it).
    pub fn is_stale(&self, record: &TokenRecord) -> bool {
        record.is_stale(self.clock.now_millis(), self.skew_ms)
    }

    /// True while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_guard.try_lock().is_err()
    }

    /// Return a usable access token, refreshing it first when stale.
    ///
    /// `Ok(None)` means there is no session and the user has to log in. A
    /// failed refresh clears the whole session before the error is returned.
    /// Callers that waited on that refresh get the same error.
    pub async fn ensure_access_token(&self) -> Result<Option<String>> {
        let seen = self.generation.load(Ordering::Acquire);

        let Some(record) = self.store.load().await else {
            return Ok(None);
        };
        if !self.is_stale(&record) {
            tracing::trace!("Access token fresh");
            return Ok(Some(record.access_token));
        }

        let mut slot = self.refresh_guard.lock().await;

        if let Some((generation, err)) = &slot.last_failure
            && *generation > seen
        {
            tracing::debug!(error = %err, "Concurrent refresh failed");
            return Err(err.clone());
        }

        let Some(record) = self.store.load().await else {
            return Ok(None);
        };
        if !self.is_stale(&record) {
            tracing::debug!("Access token refreshed by a concurrent caller");
            return Ok(Some(record.access_token));
        }

        let Some(refresh_token) = record.refresh_token() else {
            tracing::warn!("Access token expired and no refresh token is stored, clearing session");
            self.store.clear().await?;
            return Ok(None);
        };

        tracing::debug!("Access token stale, refreshing");
        let refreshed = self.run_refresh(&mut slot, refresh_token).await?;
        Ok(Some(refreshed.access_token))
    }

    /// Refresh regardless of expiry after the API rejected `rejected_token`.
    ///
    /// If another caller already replaced the rejected token, that newer
    /// token is returned without a second refresh. Any failure ends the
    /// session and yields [`OAuthError::SessionExpired`].
    pub async fn force_refresh(&self, rejected_token: &str) -> Result<String> {
        let mut slot = self.refresh_guard.lock().await;

        let Some(record) = self.store.load().await else {
            return Err(OAuthError::SessionExpired);
        };
        if record.access_token != rejected_token && !self.is_stale(&record) {
            tracing::debug!("Rejected token already replaced by a concurrent refresh");
            return Ok(record.access_token);
        }

        let Some(refresh_token) = record.refresh_token() else {
            tracing::warn!("Access token rejected and no refresh token is stored, clearing session");
            self.store.clear().await?;
            return Err(OAuthError::SessionExpired);
        };

        self.run_refresh(&mut slot, refresh_token)
            .await
            .map(|refreshed| refreshed.access_token)
            .map_err(|_| OAuthError::SessionExpired)
    }

    /// Refresh while holding the guard and publish the outcome to waiters.
    ///
    /// A failure clears the session.
    async fn run_refresh(&self, slot: &mut RefreshSlot, refresh_token: &str) -> Result<TokenRecord> {
        let outcome = self.exchange.refresh(refresh_token).await;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        match outcome {
            Ok(record) => {
                slot.last_failure = None;
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(clear_err) = self.store.clear().await {
                    tracing::error!(error = %clear_err, "Failed to clear session after refresh failure");
                }
                slot.last_failure = Some((generation, e.clone()));
                Err(e)
            }
        }
    }

    /// Expiry details of the stored session, for display.
    pub async fn token_info(&self) -> Option<TokenInfo> {
        let record = self.store.load().await?;
        let now = self.clock.now_millis();
        let expires_in_secs = u64::try_from((record.expires_at - now) / 1000).unwrap_or(0);
        Some(TokenInfo {
            expires_in_secs,
            is_expired: self.is_stale(&record),
            can_refresh: record.refresh_token().is_some(),
            scope: record.scope,
        })
    }
}

// ============================================================================
// TokenInfo
// ============================================================================

/// Information about stored tokens for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub expires_in_secs: u64,
    pub is_expired: bool,
    pub can_refresh: bool,
    pub scope: String,
}

impl TokenInfo {
    pub fn expires_in_display(&self) -> String {
        if self.is_expired {
            if self.can_refresh {
                "Expired (will refresh on next use)".to_string()
            } else {
                "Expired (log in again)".to_string()
            }
        } else {
            let hours = self.expires_in_secs / 3600;
            let minutes = (self.expires_in_secs % 3600) / 60;
            format!("{}h {}m", hours, minutes)
        }
    }
}
