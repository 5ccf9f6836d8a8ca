// ABOUTME: Configuration module organization and process-wide config access
// ABOUTME: Publishes the loaded ServerConfig for components without direct state access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module for GitGlance
//!
//! Environment-supplied configuration is parsed once at startup into a
//! [`environment::ServerConfig`] and published process-wide so the
//! centralized error responder can check the runtime environment without
//! threading state through every call site.

pub mod environment;

use environment::ServerConfig;
use std::sync::OnceLock;

static RUNTIME_CONFIG: OnceLock<ServerConfig> = OnceLock::new();

/// Publish the loaded configuration process-wide.
///
/// Later calls are ignored; the first configuration wins. Tests that build
/// ad-hoc configs simply skip publishing and get development behavior.
pub fn set_runtime_config(config: ServerConfig) {
    let _ = RUNTIME_CONFIG.set(config);
}

/// Access the process-wide configuration, if one was published.
#[must_use]
pub fn runtime_config() -> Option<&'static ServerConfig> {
    RUNTIME_CONFIG.get()
}
