// ABOUTME: Server-side session store with TTL expiry and LRU-bounded capacity
// ABOUTME: Explicit create/read/update/destroy operations keyed by random session ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Server-side session store
//!
//! Sessions are keyed by a random 256-bit identifier carried in a cookie.
//! The store is a key-value map with explicit create/read/update/destroy
//! operations; records expire after the configured TTL and the map is
//! LRU-bounded so unauthenticated cookie floods cannot grow memory without
//! limit.

use crate::config::environment::{Environment, SessionConfig};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tokio::sync::RwLock;

/// Token payload stored for an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    /// Bearer token for provider API calls
    pub access_token: String,
    /// OpenID Connect ID token, if the provider issued one
    pub id_token: Option<String>,
    /// Refresh token for renewing the access token
    pub refresh_token: Option<String>,
    /// Token type as reported by the provider (normally "Bearer")
    pub token_type: String,
    /// Access token expiry, if reported
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionUser {
    /// Whether the access token is within five minutes of expiry
    #[must_use]
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now() + Duration::minutes(5))
    }
}

/// One session record
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Authenticated token payload, absent until the code exchange succeeds
    pub user: Option<SessionUser>,
    /// Anti-forgery state issued at login start, consumed at the callback
    pub oauth_state: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user: None,
            oauth_state: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// When the session was created
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// TTL + LRU bounded session store
pub struct SessionStore {
    sessions: RwLock<LruCache<String, SessionRecord>>,
    ttl: Duration,
}

impl SessionStore {
    /// Fallback capacity when configuration specifies zero sessions
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a store from the session configuration section
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_sessions).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            sessions: RwLock::new(LruCache::new(capacity)),
            // Safe: ttl_secs is a small configuration value
            ttl: Duration::seconds(i64::try_from(config.ttl_secs).unwrap_or(86_400)),
        }
    }

    /// Create a new empty session and return its identifier
    pub async fn create(&self) -> String {
        let id = generate_session_id();
        let record = SessionRecord::new(self.ttl);
        self.sessions.write().await.put(id.clone(), record);
        id
    }

    /// Read a session record, treating expired records as absent
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get(id).cloned()?;
        if record.is_expired() {
            sessions.pop(id);
            return None;
        }
        Some(record)
    }

    /// Store the authenticated token payload on an existing session.
    ///
    /// Returns `false` if the session no longer exists (expired or evicted).
    pub async fn set_user(&self, id: &str, user: SessionUser) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(record) if !record.is_expired() => {
                record.user = Some(user);
                true
            }
            _ => false,
        }
    }

    /// Store the anti-forgery state on an existing session
    pub async fn set_oauth_state(&self, id: &str, state: String) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(record) if !record.is_expired() => {
                record.oauth_state = Some(state);
                true
            }
            _ => false,
        }
    }

    /// Take the anti-forgery state, clearing it so it is single-use
    pub async fn take_oauth_state(&self, id: &str) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(id)
            .filter(|record| !record.is_expired())
            .and_then(|record| record.oauth_state.take())
    }

    /// Destroy a session
    pub async fn destroy(&self, id: &str) {
        self.sessions.write().await.pop(id);
    }

    /// Number of live (possibly expired, not yet reaped) sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Generate a 256-bit random session identifier, hex-encoded
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build the `Set-Cookie` value carrying a session id.
///
/// SameSite and Secure are tightened in production.
#[must_use]
pub fn session_cookie(
    config: &SessionConfig,
    environment: &Environment,
    session_id: &str,
) -> String {
    let base = format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}",
        config.cookie_name, session_id, config.ttl_secs
    );
    if environment.is_production() {
        format!("{base}; Secure; SameSite=Strict")
    } else {
        format!("{base}; SameSite=Lax")
    }
}

/// Build the `Set-Cookie` value that clears the session cookie
#[must_use]
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", config.cookie_name)
}

/// Extract a cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}
