// ABOUTME: OAuth login route handlers for the delegated-authorization flow
// ABOUTME: Redirects to the provider, completes the code exchange, and handles logout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Authentication routes
//!
//! `GET /auth` starts the flow: a pre-auth session is created, an
//! anti-forgery state stored on it, and the user is redirected to the
//! provider's authorization endpoint. `GET /auth/callback` completes it:
//! the returned state is validated and the one-time code exchanged for
//! tokens, which land on the session. A failed exchange leaves the session
//! unauthenticated and propagates a provider-communication error instead of
//! redirecting onward.

use crate::errors::AppError;
use crate::middleware::session::CurrentSession;
use crate::server::AppState;
use crate::services::AuthService;
use crate::session::{clear_session_cookie, session_cookie};
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters on the provider's callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/auth", get(Self::handle_login))
            .route("/auth/callback", get(Self::handle_callback))
            .route("/logout", get(Self::handle_logout))
            .with_state(state)
    }

    /// Start the login flow: redirect to the provider's authorization URL
    async fn handle_login(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<crate::container::Scope>,
    ) -> Result<Response, AppError> {
        let auth: Arc<AuthService> = state.container.resolve_as("auth_service", &scope)?;

        let (session_id, authorize_url) = auth.begin_login().await?;
        let cookie = session_cookie(
            &state.config.session,
            &state.config.environment,
            &session_id,
        );

        Ok((
            AppendHeaders([(SET_COOKIE, cookie)]),
            Redirect::temporary(&authorize_url),
        )
            .into_response())
    }

    /// Complete the login flow: exchange the code and land on the home view
    async fn handle_callback(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<crate::container::Scope>,
        session: Option<Extension<CurrentSession>>,
        Query(query): Query<CallbackQuery>,
    ) -> Result<Response, AppError> {
        if let Some(error) = query.error {
            return Err(AppError::external_auth_failed(format!(
                "provider denied authorization: {error}"
            ))
            .with_details(serde_json::json!({
                "error_description": query.error_description,
            })));
        }

        let code = query
            .code
            .ok_or_else(|| AppError::invalid_input("callback is missing the code parameter"))?;
        let returned_state = query
            .state
            .ok_or_else(|| AppError::invalid_input("callback is missing the state parameter"))?;
        let Extension(session) = session
            .ok_or_else(|| AppError::auth_invalid("login session missing or expired"))?;

        let auth: Arc<AuthService> = state.container.resolve_as("auth_service", &scope)?;
        auth.complete_login(&session.id, &code, &returned_state)
            .await?;

        Ok(Redirect::to("/home").into_response())
    }

    /// Destroy the session and return to the landing page
    async fn handle_logout(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<crate::container::Scope>,
        session: Option<Extension<CurrentSession>>,
    ) -> Result<Response, AppError> {
        if let Some(Extension(session)) = session {
            let auth: Arc<AuthService> = state.container.resolve_as("auth_service", &scope)?;
            auth.logout(&session.id).await;
        }

        Ok((
            AppendHeaders([(SET_COOKIE, clear_session_cookie(&state.config.session))]),
            Redirect::to("/"),
        )
            .into_response())
    }
}
