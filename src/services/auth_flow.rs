// ABOUTME: Login orchestration over the OAuth client and the session store
// ABOUTME: Issues anti-forgery state at login start and validates it at the callback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use crate::oauth::{self, OAuth2Client, TokenSet};
use crate::session::{SessionStore, SessionUser};
use std::sync::Arc;
use tracing::{info, warn};

/// Login flow service.
///
/// The session moves through three states: unauthenticated (no user on the
/// record), pending (state issued, waiting for the provider to redirect
/// back), and authorized (token payload stored after a successful code
/// exchange).
pub struct AuthService {
    oauth: Arc<OAuth2Client>,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    #[must_use]
    pub fn new(oauth: Arc<OAuth2Client>, sessions: Arc<SessionStore>) -> Self {
        Self { oauth, sessions }
    }

    /// Start a login: create a pre-auth session holding a fresh anti-forgery
    /// state and build the authorization redirect URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization URL cannot be constructed.
    pub async fn begin_login(&self) -> AppResult<(String, String)> {
        let session_id = self.sessions.create().await;
        let state = oauth::generate_state();
        self.sessions
            .set_oauth_state(&session_id, state.clone())
            .await;

        let url = self.oauth.authorization_url(&state)?;
        info!("login started, redirecting to provider");
        Ok((session_id, url))
    }

    /// Complete a login: validate the returned state against the pre-auth
    /// session, exchange the code, and store the token payload.
    ///
    /// On any failure the session keeps no user and the error propagates to
    /// the centralized responder.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is missing or expired, the state does
    /// not match, or the token exchange fails.
    pub async fn complete_login(
        &self,
        session_id: &str,
        code: &str,
        returned_state: &str,
    ) -> AppResult<()> {
        let expected_state = self
            .sessions
            .take_oauth_state(session_id)
            .await
            .ok_or_else(|| AppError::auth_invalid("login session missing or expired"))?;

        if expected_state != returned_state {
            warn!("state mismatch on OAuth callback");
            return Err(AppError::auth_invalid("state parameter mismatch"));
        }

        let tokens = self.oauth.exchange_code(code).await?;
        if !self
            .sessions
            .set_user(session_id, session_user_from_tokens(tokens))
            .await
        {
            return Err(AppError::auth_invalid("login session expired mid-exchange"));
        }

        info!("login completed, token payload stored in session");
        Ok(())
    }

    /// Renew the session's access token through the refresh grant.
    ///
    /// Providers may omit the ID token on refresh responses; the original
    /// one is kept so the profile view survives a renewal.
    ///
    /// # Errors
    ///
    /// Returns an error if the session holds no refresh token or the
    /// refresh request fails.
    pub async fn refresh_session_tokens(
        &self,
        session_id: &str,
        user: &SessionUser,
    ) -> AppResult<SessionUser> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::auth_invalid("session holds no refresh token"))?;

        let tokens = self.oauth.refresh_token(refresh_token).await?;
        let mut updated = session_user_from_tokens(tokens);
        if updated.id_token.is_none() {
            updated.id_token = user.id_token.clone();
        }

        if !self.sessions.set_user(session_id, updated.clone()).await {
            return Err(AppError::auth_invalid("session expired during refresh"));
        }

        info!("access token refreshed");
        Ok(updated)
    }

    /// Destroy a session (logout)
    pub async fn logout(&self, session_id: &str) {
        self.sessions.destroy(session_id).await;
        info!("session destroyed");
    }
}

fn session_user_from_tokens(tokens: TokenSet) -> SessionUser {
    SessionUser {
        access_token: tokens.access_token,
        id_token: tokens.id_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_at: tokens.expires_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::SessionConfig;
    use crate::oauth::OAuth2Config;

    fn test_service() -> AuthService {
        let oauth = OAuth2Client::new(
            OAuth2Config {
                client_id: "app-id".into(),
                client_secret: "app-secret".into(),
                auth_url: "https://gitlab.example.com/oauth/authorize".into(),
                // Unroutable: exchange attempts in these tests must fail fast
                token_url: "http://127.0.0.1:9/oauth/token".into(),
                redirect_uri: "http://localhost:8080/auth/callback".into(),
                scopes: vec!["openid".into()],
            },
            reqwest::Client::new(),
        );
        let sessions = SessionStore::new(&SessionConfig {
            cookie_name: "sid".into(),
            secret: "s".into(),
            ttl_secs: 60,
            max_sessions: 16,
        });
        AuthService::new(Arc::new(oauth), Arc::new(sessions))
    }

    #[tokio::test]
    async fn test_begin_login_issues_state_and_url() {
        let service = test_service();
        let (session_id, url) = service.begin_login().await.unwrap();

        assert!(url.starts_with("https://gitlab.example.com/oauth/authorize?"));
        let state = service.sessions.take_oauth_state(&session_id).await.unwrap();
        assert!(url.contains(&format!("state={state}")));
    }

    #[tokio::test]
    async fn test_complete_login_rejects_state_mismatch() {
        let service = test_service();
        let (session_id, _) = service.begin_login().await.unwrap();

        let err = service
            .complete_login(&session_id, "code", "wrong-state")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);

        // Session remains unauthenticated
        let record = service.sessions.get(&session_id).await.unwrap();
        assert!(record.user.is_none());
    }

    #[tokio::test]
    async fn test_complete_login_without_session_fails() {
        let service = test_service();
        let err = service
            .complete_login("nonexistent", "code", "state")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let service = test_service();
        let (session_id, url) = service.begin_login().await.unwrap();
        let state = url.split("state=").nth(1).unwrap().to_owned();

        // First attempt consumes the state (and fails on the unroutable
        // token endpoint); a replay must fail on the missing state.
        let _ = service.complete_login(&session_id, "code", &state).await;
        let err = service
            .complete_login(&session_id, "code", &state)
            .await
            .unwrap_err();
        assert!(err.message.contains("missing or expired"));
    }
}
