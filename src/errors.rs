// ABOUTME: Unified error handling with standard error codes and HTTP response formatting
// ABOUTME: Centralized error responder that redacts detail data in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling System
//!
//! This module provides the centralized error handling system for GitGlance.
//! It defines standard error types, error codes, and HTTP response formatting
//! so every route and service surfaces failures the same way. The
//! [`axum::response::IntoResponse`] impl is the centralized error responder:
//! it logs full detail server-side and withholds detail data from clients
//! when running in production.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization (1000-1999)
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired = 1002,

    // Rate Limiting (2000-2999)
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded = 2000,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // External Services (5000-5999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    #[serde(rename = "EXTERNAL_AUTH_FAILED")]
    ExternalAuthFailed = 5002,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Service Container (7000-7999)
    #[serde(rename = "SERVICE_NOT_FOUND")]
    ServiceNotFound = 7000,
    #[serde(rename = "DEPENDENCY_CYCLE")]
    DependencyCycle = 7001,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request
            ErrorCode::InvalidInput => 400,

            // 401 Unauthorized
            ErrorCode::AuthRequired | ErrorCode::AuthInvalid => 401,

            // 403 Forbidden
            ErrorCode::AuthExpired => 403,

            // 404 Not Found
            ErrorCode::ResourceNotFound => 404,

            // 429 Too Many Requests
            ErrorCode::RateLimitExceeded => 429,

            // 502 Bad Gateway
            ErrorCode::ExternalServiceError => 502,

            // 503 Service Unavailable
            ErrorCode::ExternalAuthFailed => 503,

            // 500 Internal Server Error
            ErrorCode::ConfigError
            | ErrorCode::ServiceNotFound
            | ErrorCode::DependencyCycle
            | ErrorCode::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "Authentication is required to access this resource",
            ErrorCode::AuthInvalid => "The provided authentication credentials are invalid",
            ErrorCode::AuthExpired => "The authentication token has expired",
            ErrorCode::RateLimitExceeded => "Rate limit exceeded. Please slow down your requests",
            ErrorCode::InvalidInput => "The provided input is invalid",
            ErrorCode::ResourceNotFound => "The requested resource was not found",
            ErrorCode::ExternalServiceError => "An external service encountered an error",
            ErrorCode::ExternalAuthFailed => "Authentication with external service failed",
            ErrorCode::ConfigError => "Configuration error encountered",
            ErrorCode::ServiceNotFound => "A requested service is not registered",
            ErrorCode::DependencyCycle => "Service registrations form a dependency cycle",
            ErrorCode::InternalError => "An internal server error occurred",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Request ID for tracing
    pub request_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            request_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a request ID to the error context
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.context.request_id = Some(request_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl ErrorResponse {
    /// Build the wire representation of an error.
    ///
    /// With `redact` set (production), detail data and the request ID are
    /// withheld from the caller; the message and status code remain.
    #[must_use]
    pub fn from_error(error: AppError, redact: bool) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                request_id: if redact { None } else { error.context.request_id },
                details: if redact {
                    serde_json::Value::Null
                } else {
                    error.context.details
                },
            },
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from_error(error, false)
    }
}

/// Centralized error responder.
///
/// Logs the full error (including details and source chain) server-side,
/// then serializes the client-facing envelope according to the runtime
/// environment.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let source = self.source.as_ref().map(std::string::ToString::to_string);
        tracing::error!(
            code = ?self.code,
            status = %status,
            details = %self.context.details,
            source = source.as_deref(),
            "request failed: {}",
            self.message
        );

        let redact = crate::config::runtime_config().is_some_and(|c| c.environment.is_production());
        (status, Json(ErrorResponse::from_error(self, redact))).into_response()
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Rate limit exceeded
    #[must_use]
    pub fn rate_limit_exceeded(limit: u32, reset_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(
            ErrorCode::RateLimitExceeded,
            format!("Rate limit of {limit} requests exceeded"),
        )
        .with_details(serde_json::json!({
            "limit": limit,
            "reset_at": reset_at.to_rfc3339()
        }))
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Authentication with an external provider failed
    pub fn external_auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalAuthFailed, message)
    }

    /// Requested service name is not registered in the container
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ServiceNotFound,
            format!("service '{}' is not registered", name.into()),
        )
    }

    /// Service registrations form a cycle
    pub fn dependency_cycle(chain: &[String]) -> Self {
        Self::new(
            ErrorCode::DependencyCycle,
            format!("dependency cycle detected: {}", chain.join(" -> ")),
        )
    }
}

/// Conversion from `anyhow::Error` to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.source() {
            Some(source) => AppError::new(ErrorCode::InternalError, error.to_string())
                .with_details(serde_json::json!({
                    "source": source.to_string()
                })),
            None => AppError::new(ErrorCode::InternalError, error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::RateLimitExceeded.http_status(), 429);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ExternalServiceError.http_status(), 502);
        assert_eq!(ErrorCode::ServiceNotFound.http_status(), 500);
    }

    #[test]
    fn test_app_error_creation() {
        let error = AppError::auth_required().with_request_id("req-123");

        assert_eq!(error.code, ErrorCode::AuthRequired);
        assert!(error.context.request_id.is_some());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::rate_limit_exceeded(1000, chrono::Utc::now());
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("RATE_LIMIT_EXCEEDED"));
        assert!(json.contains("limit"));
    }

    #[test]
    fn test_error_response_redacts_details() {
        let error = AppError::not_found("route")
            .with_details(serde_json::json!({"path": "/secret"}))
            .with_request_id("req-9");
        let response = ErrorResponse::from_error(error, true);

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("/secret"));
        assert!(!json.contains("req-9"));
        assert!(json.contains("RESOURCE_NOT_FOUND"));
    }

    #[test]
    fn test_dependency_cycle_message_lists_chain() {
        let chain = vec!["a".to_owned(), "b".to_owned(), "a".to_owned()];
        let error = AppError::dependency_cycle(&chain);
        assert!(error.message.contains("a -> b -> a"));
    }
}
