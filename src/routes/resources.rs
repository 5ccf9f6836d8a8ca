// ABOUTME: Protected resource view handlers for profile, activities, and groups
// ABOUTME: Thin wrappers resolving services from the container per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Protected resource routes
//!
//! Every handler here runs behind the authentication gate; the session is
//! guaranteed to carry a token payload. Handlers resolve their service from
//! the container under the request scope and hand the view model to the
//! renderer.

use crate::container::Scope;
use crate::errors::AppError;
use crate::server::AppState;
use crate::services::{ActivitiesService, GroupsService, ProfileService};
use crate::session::SessionUser;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Pagination query parameters for the activities view
#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Protected resource routes implementation
pub struct ResourceRoutes;

impl ResourceRoutes {
    /// Create all resource view routes (the gate is applied by the caller)
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/profile", get(Self::handle_profile))
            .route("/activities", get(Self::handle_activities))
            .route("/groups", get(Self::handle_groups))
            .with_state(state)
    }

    /// Profile view: ID-token claims merged with last-activity data
    async fn handle_profile(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<Scope>,
        session: Option<Extension<crate::middleware::CurrentSession>>,
    ) -> Result<Response, AppError> {
        let user = session_user(session)?;
        let service: Arc<ProfileService> = state.container.resolve_as("profile_service", &scope)?;

        let view = service.profile(&user).await?;
        Ok((StatusCode::OK, Json(view)).into_response())
    }

    /// Paginated activity feed view
    async fn handle_activities(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<Scope>,
        session: Option<Extension<crate::middleware::CurrentSession>>,
        Query(query): Query<ActivitiesQuery>,
    ) -> Result<Response, AppError> {
        let user = session_user(session)?;
        let service: Arc<ActivitiesService> =
            state.container.resolve_as("activities_service", &scope)?;

        let view = service.activities(&user, query.page, query.limit).await?;
        Ok((StatusCode::OK, Json(view)).into_response())
    }

    /// Group/project tree view
    async fn handle_groups(
        State(state): State<Arc<AppState>>,
        Extension(scope): Extension<Scope>,
        session: Option<Extension<crate::middleware::CurrentSession>>,
    ) -> Result<Response, AppError> {
        let user = session_user(session)?;
        let service: Arc<GroupsService> = state.container.resolve_as("groups_service", &scope)?;

        let view = service.groups(&user).await?;
        Ok((StatusCode::OK, Json(view)).into_response())
    }
}

/// Extract the authenticated token payload from the request session
fn session_user(
    session: Option<Extension<crate::middleware::CurrentSession>>,
) -> Result<SessionUser, AppError> {
    session
        .and_then(|Extension(session)| session.record.user)
        .ok_or_else(AppError::auth_required)
}
