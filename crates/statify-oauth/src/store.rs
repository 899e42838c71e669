//! Session persistence.
//!
//! Two slots are kept per store:
//!
//! - the durable [`TokenRecord`], which survives restarts, and
//! - the ephemeral PKCE verifier, which lives only as long as the current
//!   process (the equivalent of a browser tab's session storage).
//!
//! The verifier slot holds exactly one value. Starting a new login overwrites
//! whatever an unfinished earlier login left there; that earlier attempt can
//! then no longer be completed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{OAuthError, Result};

/// Default session file name within the statify data directory.
pub const SESSION_FILE: &str = "session.json";

/// Persisted tokens.
///
/// Serialized as `{"accessToken","refreshToken","scope","expiresAt"}` with
/// `expiresAt` in Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_at: i64,
}

impl TokenRecord {
    /// Whether the token should be refreshed at `now_ms`, `skew_ms` ahead of expiry.
    pub fn is_stale(&self, now_ms: i64, skew_ms: i64) -> bool {
        now_ms >= self.expires_at.saturating_sub(skew_ms)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }
}

/// Decode a stored record; anything unreadable or incomplete counts as absent.
pub(crate) fn decode_record(raw: &str) -> Option<TokenRecord> {
    match serde_json::from_str::<TokenRecord>(raw) {
        Ok(record) if !record.access_token.is_empty() => Some(record),
        Ok(_) => {
            tracing::warn!("Stored session has no access token, ignoring it");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored session is unreadable, ignoring it");
            None
        }
    }
}

// ============================================================================
// SessionStore Trait
// ============================================================================

/// Storage for the token record and the pending PKCE verifier.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Persist the record, replacing any previous one.
    async fn save(&self, record: &TokenRecord) -> Result<()>;

    /// Load the record. Corrupt or foreign data yields `None`.
    async fn load(&self) -> Option<TokenRecord>;

    /// Remove the record and the pending verifier.
    async fn clear(&self) -> Result<()>;

    /// Store the verifier for the login in progress, replacing any older one.
    async fn save_verifier(&self, verifier: &str) -> Result<()>;

    async fn load_verifier(&self) -> Option<String>;

    async fn clear_verifier(&self) -> Result<()>;
}

// ============================================================================
// MemorySessionStore
// ============================================================================

/// In-memory store, used by tests and embedders that manage persistence themselves.
///
/// The record is held in serialized form so it behaves like real storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    durable: RwLock<Option<String>>,
    verifier: RwLock<Option<String>>,
    writes: AtomicU32,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the durable slot with raw data, bypassing serialization.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            durable: RwLock::new(Some(raw.into())),
            ..Self::default()
        }
    }

    /// Seed the durable slot with a record.
    pub fn with_record(record: &TokenRecord) -> Result<Self> {
        Ok(Self::with_raw(serde_json::to_string(record)?))
    }

    /// Number of writes (saves and clears) performed so far.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: &TokenRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        *self.durable.write().await = Some(json);
        self.record_write();
        Ok(())
    }

    async fn load(&self) -> Option<TokenRecord> {
        let raw = self.durable.read().await;
        raw.as_deref().and_then(decode_record)
    }

    async fn clear(&self) -> Result<()> {
        *self.durable.write().await = None;
        *self.verifier.write().await = None;
        self.record_write();
        Ok(())
    }

    async fn save_verifier(&self, verifier: &str) -> Result<()> {
        *self.verifier.write().await = Some(verifier.to_string());
        self.record_write();
        Ok(())
    }

    async fn load_verifier(&self) -> Option<String> {
        self.verifier.read().await.clone()
    }

    async fn clear_verifier(&self) -> Result<()> {
        *self.verifier.write().await = None;
        self.record_write();
        Ok(())
    }
}

// ============================================================================
// FileSessionStore
// ============================================================================

/// File-backed store for production use.
///
/// The record is written as JSON to `session.json`; the verifier stays in
/// process memory and is gone once the process exits.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    verifier: RwLock<Option<String>>,
}

impl FileSessionStore {
    /// Create a store keeping its file in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(SESSION_FILE))
    }

    /// Create with a custom session file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            verifier: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, record: &TokenRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OAuthError::Storage(format!("Failed to create session directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(record)?;

        // Write then rename so readers never see a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| OAuthError::Storage(format!("Failed to write session file: {}", e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| OAuthError::Storage(format!("Failed to replace session file: {}", e)))?;

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn load(&self) -> Option<TokenRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => decode_record(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                None
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(OAuthError::Storage(format!(
                    "Failed to delete session file: {}",
                    e
                )));
            }
        }
        *self.verifier.write().await = None;
        tracing::debug!(path = %self.path.display(), "Session cleared");
        Ok(())
    }

    async fn save_verifier(&self, verifier: &str) -> Result<()> {
        *self.verifier.write().await = Some(verifier.to_string());
        Ok(())
    }

    async fn load_verifier(&self) -> Option<String> {
        self.verifier.read().await.clone()
    }

    async fn clear_verifier(&self) -> Result<()> {
        *self.verifier.write().await = None;
        Ok(())
    }
}
