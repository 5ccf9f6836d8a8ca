// ABOUTME: Fixed-window rate limiting middleware for HTTP requests
// ABOUTME: Enforces per-client request limits and emits standard rate limit headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Rate Limiting Middleware with HTTP Headers
//!
//! A fixed-window counter per client key (forwarded-for address or socket
//! peer). Responses carry standard `X-RateLimit-*` headers; exceeding the
//! limit yields a 429 with `Retry-After`.

use crate::config::environment::RateLimitConfig;
use crate::errors::AppError;
use crate::middleware::session::request_scope;
use crate::server::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use http::{HeaderMap, HeaderValue};
use std::net::SocketAddr;
use std::sync::Arc;

/// HTTP header names for rate limiting
pub mod headers {
    /// Maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// Remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// Unix timestamp when the window resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// Seconds until the window resets
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Outcome of one rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

struct WindowEntry {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Fixed-window request counter keyed by client
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, WindowEntry>,
}

impl FixedWindowRateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            // Safe: window_secs is a small configuration value
            window: Duration::seconds(i64::try_from(config.window_secs).unwrap_or(60)),
            windows: DashMap::new(),
        }
    }

    /// Count one request for `key` and decide whether it is allowed
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Utc::now();
        let mut entry = self.windows.entry(key.to_owned()).or_insert(WindowEntry {
            window_start: now,
            count: 0,
        });

        if now - entry.window_start >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }
        entry.count += 1;

        RateLimitDecision {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_at: entry.window_start + self.window,
        }
    }
}

/// Create a `HeaderMap` with rate limit headers
#[must_use]
pub fn create_rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert(headers::X_RATE_LIMIT_LIMIT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert(headers::X_RATE_LIMIT_REMAINING, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_at.timestamp().to_string()) {
        headers.insert(headers::X_RATE_LIMIT_RESET, value);
    }
    if !decision.allowed {
        let retry_after = (decision.reset_at - Utc::now()).num_seconds().max(0);
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            headers.insert(headers::RETRY_AFTER, value);
        }
    }

    headers
}

/// Rate limiting middleware
///
/// # Errors
///
/// Returns an error if the limiter cannot be resolved from the container.
pub async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let scope = request_scope(&req)?;
    let limiter: Arc<FixedWindowRateLimiter> =
        state.container.resolve_as("rate_limiter", &scope)?;

    let key = client_key(&req);
    let decision = limiter.check(&key);
    let rate_headers = create_rate_limit_headers(&decision);

    if !decision.allowed {
        tracing::warn!(client = %key, "rate limit exceeded");
        let mut response =
            AppError::rate_limit_exceeded(decision.limit, decision.reset_at).into_response();
        response.headers_mut().extend(rate_headers);
        return Ok(response);
    }

    let mut response = next.run(req).await;
    response.headers_mut().extend(rate_headers);
    Ok(response)
}

/// Derive the limiter key for a request: the first forwarded-for address
/// when present, the socket peer otherwise.
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn test_requests_within_limit_allowed() {
        let limiter = limiter(3, 60);
        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").allowed);
        }
        assert!(!limiter.check("1.2.3.4").allowed);
    }

    #[test]
    fn test_clients_are_isolated() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("1.2.3.4").allowed);
        assert!(limiter.check("5.6.7.8").allowed);
        assert!(!limiter.check("1.2.3.4").allowed);
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let limiter = limiter(1, 0);
        assert!(limiter.check("1.2.3.4").allowed);
        // Zero-length window: the next check starts a fresh window
        assert!(limiter.check("1.2.3.4").allowed);
    }

    #[test]
    fn test_headers_present_on_decision() {
        let limiter = limiter(5, 60);
        let decision = limiter.check("1.2.3.4");
        let headers = create_rate_limit_headers(&decision);
        assert_eq!(headers.get(headers::X_RATE_LIMIT_LIMIT).unwrap(), "5");
        assert_eq!(headers.get(headers::X_RATE_LIMIT_REMAINING).unwrap(), "4");
        assert!(headers.get(headers::RETRY_AFTER).is_none());
    }
}
