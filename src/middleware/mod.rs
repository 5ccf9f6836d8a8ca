// ABOUTME: HTTP middleware for sessions, request scoping, rate limiting, and headers
// ABOUTME: Provides the authentication gate applied in front of protected views
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

pub mod rate_limiting;
pub mod security_headers;
pub mod session;

// Session extraction and the authentication gate
pub use session::{attach_request_scope, attach_session, require_session, CurrentSession};

// Rate limiting middleware and utilities
pub use rate_limiting::{
    create_rate_limit_headers, enforce_rate_limit, headers, FixedWindowRateLimiter,
    RateLimitDecision,
};
