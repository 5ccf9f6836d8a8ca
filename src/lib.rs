// ABOUTME: Main library entry point for the GitGlance GitLab portal
// ABOUTME: Provides OAuth2 login against GitLab and proxied profile/activity/group views
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # GitGlance
//!
//! A server-rendered web portal that authenticates a user against a GitLab
//! instance via the OAuth2 authorization-code flow and shows proxied data:
//! profile information, the recent activity feed, and group/project listings.
//!
//! Tokens obtained from the code exchange live in a server-side session and
//! are used to call GitLab's GraphQL and REST APIs; responses are reshaped
//! into plain view models before rendering.
//!
//! ## Architecture
//!
//! - **Container**: named service registry with transient, request-scoped,
//!   and singleton lifetimes
//! - **OAuth**: authorization URL construction and code-for-token exchange
//! - **GitLab**: thin GraphQL and REST clients over the provider APIs
//! - **Services**: profile, activities, and groups view-model assembly
//! - **Routes**: thin HTTP handlers delegating to the services
//! - **Session**: TTL-bounded server-side session store
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gitglance::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("GitGlance configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Named service registry with lifetime management
pub mod container;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// GitLab GraphQL and REST API clients
pub mod gitlab;

/// Logging configuration and structured logging setup
pub mod logging;

/// Request middleware: sessions, authentication gate, rate limiting
pub mod middleware;

/// View models handed to the rendering step
pub mod models;

/// OAuth2 delegated-authorization client
pub mod oauth;

/// HTTP routes organized by domain
pub mod routes;

/// Application bootstrap and router assembly
pub mod server;

/// Server-side session store
pub mod session;

/// View-model assembly services over the provider clients
pub mod services;
