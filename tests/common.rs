// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides config builders, router helpers, and an in-process provider stub
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(dead_code)]

//! Shared test utilities for `gitglance`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response};
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use gitglance::config::environment::{
    Environment, GitLabConfig, HttpClientConfig, OAuthConfig, RateLimitConfig, ServerConfig,
    SessionConfig,
};
use gitglance::server::AppState;
use gitglance::session::{SessionStore, SessionUser};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test configuration pointing at the given provider base URL
pub fn test_config(gitlab_base_url: &str) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        oauth: OAuthConfig {
            client_id: "app-id".into(),
            client_secret: "app-secret".into(),
            redirect_uri: "http://localhost:8080/auth/callback".into(),
            scopes: vec!["openid".into(), "read_api".into()],
        },
        gitlab: GitLabConfig {
            base_url: gitlab_base_url.trim_end_matches('/').to_owned(),
        },
        session: SessionConfig {
            cookie_name: "gitglance_sid".into(),
            secret: "test-secret".into(),
            ttl_secs: 60,
            max_sessions: 64,
        },
        http: HttpClientConfig { timeout_secs: 2 },
        rate_limit: RateLimitConfig {
            max_requests: 10_000,
            window_secs: 60,
        },
    }
}

/// Build the application state and router for a test
pub fn create_test_app(gitlab_base_url: &str) -> (Arc<AppState>, Router) {
    init_test_logging();
    let state = Arc::new(AppState::new(test_config(gitlab_base_url)).unwrap());
    let router = gitglance::server::build_router(state.clone());
    (state, router)
}

/// Spawn an in-process stub standing in for the provider, returning its base URL
pub async fn spawn_provider_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Compact-serialize ID-token claims with a dummy header and signature
pub fn encode_id_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.sig")
}

/// The session store singleton backing the given application state
pub fn session_store(state: &Arc<AppState>) -> Arc<SessionStore> {
    state
        .container
        .resolve_as("session_store", &gitglance::container::Scope::new())
        .unwrap()
}

/// Token payload used by most authenticated-session tests
pub fn test_session_user() -> SessionUser {
    SessionUser {
        access_token: "test-access-token".into(),
        id_token: Some(encode_id_token(&serde_json::json!({
            "sub": "42",
            "email": "dev@example.com",
            "preferred_username": "dev",
            "name": "Dev Eloper",
            "picture": "https://example.com/a.png"
        }))),
        refresh_token: None,
        token_type: "Bearer".into(),
        expires_at: None,
    }
}

/// Create a session carrying the given token payload, returning its id
pub async fn create_session_with_user(state: &Arc<AppState>, user: SessionUser) -> String {
    let sessions = session_store(state);
    let session_id = sessions.create().await;
    let ok = sessions.set_user(&session_id, user).await;
    assert!(ok, "session must accept the test user");
    session_id
}

/// Create an authenticated session directly in the store, returning its id
pub async fn create_authenticated_session(state: &Arc<AppState>) -> String {
    create_session_with_user(state, test_session_user()).await
}

/// Build a GET request, optionally with a session cookie
pub fn get_request(uri: &str, session_cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = session_cookie {
        builder = builder.header(COOKIE, format!("gitglance_sid={cookie}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Extract the session id from a `Set-Cookie` response header
pub fn session_id_from_response(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()?
        .split_once('=')
        .map(|(_, value)| value.to_owned())
}

/// Extract the `Location` header from a redirect response
pub fn location_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(LOCATION)?
        .to_str()
        .ok()
        .map(str::to_owned)
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
