// ABOUTME: Landing and home page route handlers
// ABOUTME: Public entry page plus the authenticated home view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::AppError;
use crate::middleware::CurrentSession;
use crate::models::HomeView;
use crate::oauth::id_token;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};

const LANDING_PAGE: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>GitGlance</title>
  </head>
  <body>
    <h1>GitGlance</h1>
    <p>A read-only window into your GitLab account.</p>
    <p><a href="/auth">Sign in with GitLab</a></p>
  </body>
</html>
"#;

/// Landing and home routes implementation
pub struct PageRoutes;

impl PageRoutes {
    /// Create the public landing route
    pub fn landing_routes() -> Router {
        Router::new().route("/", get(Self::handle_landing))
    }

    /// Create the authenticated home route (the gate is applied by the caller)
    pub fn home_routes() -> Router {
        Router::new().route("/home", get(Self::handle_home))
    }

    /// Landing page with the sign-in link
    async fn handle_landing() -> Html<&'static str> {
        Html(LANDING_PAGE)
    }

    /// Home view shown after a completed login
    async fn handle_home(
        session: Option<Extension<CurrentSession>>,
    ) -> Result<Response, AppError> {
        let user = session
            .and_then(|Extension(session)| session.record.user)
            .ok_or_else(AppError::auth_required)?;

        // Username is a display nicety; a session without an ID token still
        // gets a home view.
        let username = user
            .id_token
            .as_deref()
            .and_then(|token| id_token::decode_claims(token).ok())
            .and_then(|claims| claims.preferred_username);

        let view = HomeView {
            username,
            sections: vec![
                "/profile".to_owned(),
                "/activities".to_owned(),
                "/groups".to_owned(),
            ],
        };
        Ok((StatusCode::OK, Json(view)).into_response())
    }
}
