// ABOUTME: Route module organization for GitGlance HTTP endpoints
// ABOUTME: Centralized route definitions organized by domain with thin handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Route module for GitGlance
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer via the container.

/// OAuth login, callback, and logout routes
pub mod auth;

/// Health check and system status routes
pub mod health;

/// Landing and home page routes
pub mod pages;

/// Protected resource views: profile, activities, groups
pub mod resources;

pub use auth::AuthRoutes;
pub use health::HealthRoutes;
pub use pages::PageRoutes;
pub use resources::ResourceRoutes;
