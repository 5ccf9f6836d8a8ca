// ABOUTME: Request-scope creation, session extraction, and the authentication gate
// ABOUTME: Loads the session record named by the cookie and guards protected views
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::container::Scope;
use crate::errors::{AppError, AppResult};
use crate::server::AppState;
use crate::session::{get_cookie_value, SessionRecord, SessionStore};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

/// Session attached to the current request by [`attach_session`]
#[derive(Clone)]
pub struct CurrentSession {
    /// Session identifier from the cookie
    pub id: String,
    /// Session record as read at the start of the request
    pub record: SessionRecord,
}

impl CurrentSession {
    /// Whether the session completed the code exchange
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.record.user.is_some()
    }
}

/// Create a fresh container [`Scope`] for this request.
///
/// Installed outermost so every later stage (and every handler) resolves
/// scoped services against the same per-request cache.
pub async fn attach_request_scope(mut req: Request, next: Next) -> Response {
    let scope = Scope::new();
    tracing::trace!(scope_id = %scope.id(), "request scope created");
    req.extensions_mut().insert(scope);
    next.run(req).await
}

/// Load the session named by the request cookie, if any, and attach it to
/// the request extensions.
///
/// Access tokens nearing expiry are renewed here, once per request, so
/// downstream provider calls never start with a token about to lapse. A
/// failed renewal keeps the current token; the provider call that follows
/// surfaces the real error.
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let scope = request_scope(&req)?;
    let sessions: Arc<SessionStore> = state.container.resolve_as("session_store", &scope)?;

    if let Some(session_id) = get_cookie_value(req.headers(), &state.config.session.cookie_name) {
        if let Some(mut record) = sessions.get(&session_id).await {
            if let Some(user) = record.user.as_ref() {
                if user.will_expire_soon() && user.refresh_token.is_some() {
                    let auth: Arc<crate::services::AuthService> =
                        state.container.resolve_as("auth_service", &scope)?;
                    match auth.refresh_session_tokens(&session_id, user).await {
                        Ok(updated) => record.user = Some(updated),
                        Err(error) => {
                            tracing::warn!("token refresh failed, keeping current token: {error}");
                        }
                    }
                }
            }
            req.extensions_mut().insert(CurrentSession {
                id: session_id,
                record,
            });
        }
    }

    Ok(next.run(req).await)
}

/// Authentication gate for protected views.
///
/// Unauthenticated access is a redirect to the landing page, not an error.
pub async fn require_session(req: Request, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<CurrentSession>()
        .is_some_and(CurrentSession::is_authenticated);

    if authenticated {
        next.run(req).await
    } else {
        Redirect::to("/").into_response()
    }
}

/// Read the request scope installed by [`attach_request_scope`]
///
/// # Errors
///
/// Returns an internal error if the scope middleware did not run.
pub fn request_scope(req: &Request) -> AppResult<Scope> {
    req.extensions()
        .get::<Scope>()
        .cloned()
        .ok_or_else(|| AppError::internal("request scope missing from extensions"))
}
