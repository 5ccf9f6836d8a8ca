// ABOUTME: Application bootstrap wiring the container, middleware stack, and routes
// ABOUTME: Builds the axum router and runs the HTTP listener
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Application bootstrap
//!
//! [`AppState::new`] wires every component into the service container;
//! [`build_router`] assembles the middleware stack and mounts the routes;
//! [`run`] binds the listener and serves until shutdown.

use crate::config::environment::ServerConfig;
use crate::container::{downcast_instance, Container, Lifetime};
use crate::errors::{AppError, AppResult};
use crate::gitlab::{GraphqlClient, RestClient};
use crate::middleware::{self, security_headers, FixedWindowRateLimiter};
use crate::oauth::{OAuth2Client, OAuth2Config};
use crate::routes::{AuthRoutes, HealthRoutes, PageRoutes, ResourceRoutes};
use crate::services::{ActivitiesService, AuthService, GroupsService, ProfileService};
use crate::session::SessionStore;
use axum::http::Uri;
use axum::middleware as axum_middleware;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state: the container plus the parsed configuration
pub struct AppState {
    pub container: Arc<Container>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire all components into a fresh container
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be constructed.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        let config = Arc::new(config);
        let container = Arc::new(build_container(&config));
        Ok(Self { container, config })
    }
}

/// Register every component in the container.
///
/// Provider clients and the session store are singletons; the services over
/// them are request-scoped, so one request reuses one service instance
/// across its handler and middleware while concurrent requests stay
/// isolated. Re-registering any name (e.g. from a test) swaps the
/// implementation for all later resolutions.
#[must_use]
pub fn build_container(config: &Arc<ServerConfig>) -> Container {
    let container = Container::new();

    container.register_instance("config", (**config).clone());

    container.register_factory("http_client", Lifetime::Singleton, |resolver| {
        let config: Arc<ServerConfig> = resolver.resolve_as("config")?;
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))
    });

    container.register_factory("session_store", Lifetime::Singleton, |resolver| {
        let config: Arc<ServerConfig> = resolver.resolve_as("config")?;
        Ok(SessionStore::new(&config.session))
    });

    container.register_factory("rate_limiter", Lifetime::Singleton, |resolver| {
        let config: Arc<ServerConfig> = resolver.resolve_as("config")?;
        Ok(FixedWindowRateLimiter::new(&config.rate_limit))
    });

    container.register_constructor(
        "oauth_client",
        &["config", "http_client"],
        Lifetime::Singleton,
        |deps| {
            let config: Arc<ServerConfig> = downcast_instance(deps[0].clone(), "config")?;
            let client: Arc<reqwest::Client> = downcast_instance(deps[1].clone(), "http_client")?;
            Ok(OAuth2Client::new(
                OAuth2Config {
                    client_id: config.oauth.client_id.clone(),
                    client_secret: config.oauth.client_secret.clone(),
                    auth_url: config.gitlab.authorize_url(),
                    token_url: config.gitlab.token_url(),
                    redirect_uri: config.oauth.redirect_uri.clone(),
                    scopes: config.oauth.scopes.clone(),
                },
                (*client).clone(),
            ))
        },
    );

    container.register_constructor(
        "gitlab_graphql",
        &["config", "http_client"],
        Lifetime::Singleton,
        |deps| {
            let config: Arc<ServerConfig> = downcast_instance(deps[0].clone(), "config")?;
            let client: Arc<reqwest::Client> = downcast_instance(deps[1].clone(), "http_client")?;
            Ok(GraphqlClient::new(&config.gitlab, (*client).clone()))
        },
    );

    container.register_constructor(
        "gitlab_rest",
        &["config", "http_client"],
        Lifetime::Singleton,
        |deps| {
            let config: Arc<ServerConfig> = downcast_instance(deps[0].clone(), "config")?;
            let client: Arc<reqwest::Client> = downcast_instance(deps[1].clone(), "http_client")?;
            Ok(RestClient::new(&config.gitlab, (*client).clone()))
        },
    );

    container.register_factory("auth_service", Lifetime::Scoped, |resolver| {
        let oauth: Arc<OAuth2Client> = resolver.resolve_as("oauth_client")?;
        let sessions: Arc<SessionStore> = resolver.resolve_as("session_store")?;
        Ok(AuthService::new(oauth, sessions))
    });

    container.register_factory("profile_service", Lifetime::Scoped, |resolver| {
        let graphql: Arc<GraphqlClient> = resolver.resolve_as("gitlab_graphql")?;
        Ok(ProfileService::new(graphql))
    });

    container.register_factory("activities_service", Lifetime::Scoped, |resolver| {
        let rest: Arc<RestClient> = resolver.resolve_as("gitlab_rest")?;
        Ok(ActivitiesService::new(rest))
    });

    container.register_factory("groups_service", Lifetime::Scoped, |resolver| {
        let graphql: Arc<GraphqlClient> = resolver.resolve_as("gitlab_graphql")?;
        Ok(GroupsService::new(graphql))
    });

    container
}

/// Assemble the full router with the middleware stack
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(PageRoutes::home_routes())
        .merge(ResourceRoutes::routes(state.clone()))
        .route_layer(axum_middleware::from_fn(middleware::require_session));

    let router = Router::new()
        .merge(PageRoutes::landing_routes())
        .merge(AuthRoutes::routes(state.clone()))
        .merge(HealthRoutes::routes())
        .merge(protected)
        .fallback(handle_not_found)
        // Innermost first: session extraction needs the scope, the gate
        // needs the session, so the scope layer must wrap both.
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::attach_session,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::enforce_rate_limit,
        ))
        .layer(axum_middleware::from_fn(middleware::attach_request_scope))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    security_headers::apply(router, &state.config.environment)
}

/// Centralized 404 for unmatched routes, with the requested path captured
async fn handle_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("route {}", uri.path()))
        .with_details(serde_json::json!({ "path": uri.to_string() }))
}

/// Bind the listener and serve until interrupted
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
