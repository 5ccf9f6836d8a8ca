// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Default provider instance when `GITLAB_BASE_URL` is unset
const DEFAULT_GITLAB_BASE_URL: &str = "https://gitlab.com";
/// Default OAuth scopes requested during authorization
const DEFAULT_OAUTH_SCOPES: &str = "openid profile email read_api";
/// Default session cookie name
const DEFAULT_SESSION_COOKIE: &str = "gitglance_sid";
/// Session lifetime: one day
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
/// Outbound provider call timeout
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// Fixed-window rate limit defaults
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 120;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Environment type for security and error-detail configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// OAuth client registration against the GitLab instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth application client id
    pub client_id: String,
    /// OAuth application client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
}

/// Provider endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance (no trailing slash)
    pub base_url: String,
}

impl GitLabConfig {
    /// OAuth authorization endpoint
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/oauth/authorize", self.base_url)
    }

    /// OAuth token endpoint
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    /// GraphQL API endpoint
    #[must_use]
    pub fn graphql_url(&self) -> String {
        format!("{}/api/graphql", self.base_url)
    }

    /// REST API v4 base
    #[must_use]
    pub fn rest_base_url(&self) -> String {
        format!("{}/api/v4", self.base_url)
    }
}

/// Session cookie and store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name carrying the session id
    pub cookie_name: String,
    /// Session secret from the deployment environment
    pub secret: String,
    /// Session lifetime in seconds
    pub ttl_secs: u64,
    /// Maximum number of live sessions retained
    pub max_sessions: usize,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Timeout applied to every outbound provider call
    pub timeout_secs: u64,
}

/// Inbound rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Runtime environment
    pub environment: Environment,
    /// OAuth client registration
    pub oauth: OAuthConfig,
    /// Provider endpoints
    pub gitlab: GitLabConfig,
    /// Session cookie and store settings
    pub session: SessionConfig,
    /// Outbound HTTP client settings
    pub http: HttpClientConfig,
    /// Inbound rate limiting settings
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable (`GITLAB_CLIENT_ID`,
    /// `GITLAB_CLIENT_SECRET`, `GITLAB_REDIRECT_URI`) is missing, if a
    /// numeric variable fails to parse, or if `SESSION_SECRET` is absent in
    /// production.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        );

        let base_url = env_var_or("GITLAB_BASE_URL", DEFAULT_GITLAB_BASE_URL)?
            .trim_end_matches('/')
            .to_owned();

        let secret = match env::var("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment.is_production() => {
                anyhow::bail!("SESSION_SECRET must be set in production")
            }
            Err(_) => "gitglance-dev-secret".to_owned(),
        };

        let config = ServerConfig {
            http_port: env_var_or("HTTP_PORT", "8080")?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment,
            oauth: OAuthConfig {
                client_id: env::var("GITLAB_CLIENT_ID")
                    .context("GITLAB_CLIENT_ID must be set")?,
                client_secret: env::var("GITLAB_CLIENT_SECRET")
                    .context("GITLAB_CLIENT_SECRET must be set")?,
                redirect_uri: env::var("GITLAB_REDIRECT_URI")
                    .context("GITLAB_REDIRECT_URI must be set")?,
                scopes: parse_scopes(&env_var_or("OAUTH_SCOPES", DEFAULT_OAUTH_SCOPES)?),
            },
            gitlab: GitLabConfig { base_url },
            session: SessionConfig {
                cookie_name: env_var_or("SESSION_COOKIE_NAME", DEFAULT_SESSION_COOKIE)?,
                secret,
                ttl_secs: env_var_or("SESSION_TTL_SECS", &DEFAULT_SESSION_TTL_SECS.to_string())?
                    .parse()
                    .context("Invalid SESSION_TTL_SECS value")?,
                max_sessions: env_var_or("SESSION_MAX_SESSIONS", "10000")?
                    .parse()
                    .context("Invalid SESSION_MAX_SESSIONS value")?,
            },
            http: HttpClientConfig {
                timeout_secs: env_var_or(
                    "HTTP_TIMEOUT_SECS",
                    &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
                )?
                .parse()
                .context("Invalid HTTP_TIMEOUT_SECS value")?,
            },
            rate_limit: RateLimitConfig {
                max_requests: env_var_or(
                    "RATE_LIMIT_MAX_REQUESTS",
                    &DEFAULT_RATE_LIMIT_MAX_REQUESTS.to_string(),
                )?
                .parse()
                .context("Invalid RATE_LIMIT_MAX_REQUESTS value")?,
                window_secs: env_var_or(
                    "RATE_LIMIT_WINDOW_SECS",
                    &DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
                )?
                .parse()
                .context("Invalid RATE_LIMIT_WINDOW_SECS value")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URI is not a valid absolute URL or
    /// the scope list is empty.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.oauth.redirect_uri)
            .context("GITLAB_REDIRECT_URI is not a valid URL")?;
        anyhow::ensure!(!self.oauth.scopes.is_empty(), "OAUTH_SCOPES must not be empty");
        Ok(())
    }

    /// One-line startup summary, with secrets elided
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} port={} provider={} scopes=[{}] session_ttl={}s",
            self.environment,
            self.http_port,
            self.gitlab.base_url,
            self.oauth.scopes.join(" "),
            self.session.ttl_secs,
        )
    }
}

/// Split a space- or comma-separated scope string
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split([' ', ','])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Read an environment variable with a default fallback
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        env::set_var("GITLAB_CLIENT_ID", "app-id");
        env::set_var("GITLAB_CLIENT_SECRET", "app-secret");
        env::set_var("GITLAB_REDIRECT_URI", "http://localhost:8080/auth/callback");
    }

    fn clear_vars() {
        for key in [
            "GITLAB_CLIENT_ID",
            "GITLAB_CLIENT_SECRET",
            "GITLAB_REDIRECT_URI",
            "GITLAB_BASE_URL",
            "OAUTH_SCOPES",
            "ENVIRONMENT",
            "SESSION_SECRET",
            "HTTP_PORT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_vars();
        set_required_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.gitlab.base_url, "https://gitlab.com");
        assert_eq!(config.session.cookie_name, "gitglance_sid");
        assert_eq!(config.session.ttl_secs, 86_400);
        assert!(config.environment.is_development());
        assert_eq!(
            config.oauth.scopes,
            vec!["openid", "profile", "email", "read_api"]
        );
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_client_id_fails() {
        clear_vars();
        env::set_var("GITLAB_CLIENT_SECRET", "app-secret");
        env::set_var("GITLAB_REDIRECT_URI", "http://localhost:8080/auth/callback");

        assert!(ServerConfig::from_env().is_err());
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_production_requires_session_secret() {
        clear_vars();
        set_required_vars();
        env::set_var("ENVIRONMENT", "production");

        assert!(ServerConfig::from_env().is_err());

        env::set_var("SESSION_SECRET", "deployment-secret");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.environment.is_production());
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_base_url_trailing_slash_trimmed() {
        clear_vars();
        set_required_vars();
        env::set_var("GITLAB_BASE_URL", "https://git.example.com/");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.gitlab.base_url, "https://git.example.com");
        assert_eq!(
            config.gitlab.token_url(),
            "https://git.example.com/oauth/token"
        );
        assert_eq!(
            config.gitlab.graphql_url(),
            "https://git.example.com/api/graphql"
        );
        assert_eq!(
            config.gitlab.rest_base_url(),
            "https://git.example.com/api/v4"
        );
        clear_vars();
    }

    #[test]
    fn test_environment_parsing() {
        assert!(Environment::from_str_or_default("prod").is_production());
        assert!(Environment::from_str_or_default("DEVELOPMENT").is_development());
        assert!(Environment::from_str_or_default("junk").is_development());
    }

    #[test]
    fn test_parse_scopes_handles_commas() {
        assert_eq!(parse_scopes("openid,email"), vec!["openid", "email"]);
        assert_eq!(parse_scopes("openid  email"), vec!["openid", "email"]);
    }
}
