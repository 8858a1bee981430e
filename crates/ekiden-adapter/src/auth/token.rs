/*
[INPUT]:  Bearer tokens issued by the gateway and optional lifetimes
[OUTPUT]: Token retrieval and expiration status shared across clients
[POS]:    Auth layer - token lifecycle for REST and the private stream
[UPDATE]: When adding token refresh or changing storage strategy
*/

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

/// Stored token with optional expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Thread-safe bearer token store.
///
/// Clones share the same slot, so one `set_token` reaches every holder.
/// Each store bumps a revision that [`TokenStore::changes`] observers see.
#[derive(Debug, Clone)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for TokenStore {
    fn default() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            data: Arc::new(RwLock::new(None)),
            revision: Arc::new(revision),
        }
    }
}

impl TokenStore {
    /// Create a new empty token store
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver that wakes whenever a token is stored through any clone
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Store a token that never expires client-side
    pub fn set_token(&self, token: impl Into<String>) {
        self.store(TokenData {
            token: token.into(),
            expires_at: None,
        });
    }

    /// Store a token that expires after `expires_seconds`.
    ///
    /// Lifetimes past the representable range never expire client-side.
    pub fn set_token_with_expiry(&self, token: impl Into<String>, expires_seconds: u64) {
        self.store(TokenData {
            token: token.into(),
            expires_at: expiry_after(Utc::now(), expires_seconds),
        });
    }

    /// Current token, unless missing or expired
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|data| !is_past(data.expires_at))
            .map(|data| data.token.clone())
    }

    /// Check if token is missing or expired
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) => is_past(data.expires_at),
            None => true,
        }
    }

    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    fn store(&self, token_data: TokenData) {
        {
            let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Some(token_data);
        }
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

fn expiry_after(now: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    let lifetime = Duration::try_seconds(seconds)?;
    now.checked_add_signed(lifetime)
}

fn is_past(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.is_some_and(|at| Utc::now() >= at)
}
