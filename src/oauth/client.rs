// ABOUTME: OAuth2 client for the GitLab delegated-authorization flow
// ABOUTME: Builds authorization URLs and exchanges authorization codes for tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// OAuth client settings, assembled from the server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// Tokens returned by the provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenSet {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    #[must_use]
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now() + Duration::minutes(5))
    }
}

/// Stateless OAuth2 client over the provider's authorize/token endpoints
pub struct OAuth2Client {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl OAuth2Client {
    #[must_use]
    pub fn new(config: OAuth2Config, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build the authorization URL the user is redirected to
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is malformed
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AppError::config(format!("invalid authorization URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    ///
    /// A single form-encoded POST to the token endpoint. Any failure mode
    /// (network, non-2xx, malformed payload) surfaces as a
    /// provider-communication error and leaves the caller's session
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange request fails or the response
    /// is invalid
    pub async fn exchange_code(&self, code: &str) -> AppResult<TokenSet> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        self.request_token(&params).await
    }

    /// Refresh an expired access token
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh request fails or the response
    /// is invalid
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenSet> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        self.request_token(&params).await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> AppResult<TokenSet> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                AppError::external_auth_failed(format!("token endpoint unreachable: {e}"))
                    .with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_auth_failed(format!(
                "token endpoint returned {status}"
            ))
            .with_details(serde_json::json!({
                "status": status.as_u16(),
                "body": truncate(&body, 512),
            })));
        }

        let payload: TokenResponse = response.json().await.map_err(|e| {
            AppError::external_auth_failed(format!("malformed token response: {e}")).with_source(e)
        })?;

        Ok(Self::token_from_response(payload))
    }

    fn token_from_response(response: TokenResponse) -> TokenSet {
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(i64::try_from(seconds).unwrap_or(3600)));

        TokenSet {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            scope: response.scope,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    id_token: Option<String>,
    scope: Option<String>,
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_client() -> OAuth2Client {
        OAuth2Client::new(
            OAuth2Config {
                client_id: "app-id".into(),
                client_secret: "app-secret".into(),
                auth_url: "https://gitlab.example.com/oauth/authorize".into(),
                token_url: "https://gitlab.example.com/oauth/token".into(),
                redirect_uri: "http://localhost:8080/auth/callback".into(),
                scopes: vec!["openid".into(), "read_api".into()],
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_carries_configured_parameters() {
        let url = test_client().authorization_url("state-123").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("gitlab.example.com"));
        assert_eq!(parsed.path(), "/oauth/authorize");
        assert_eq!(query["client_id"], "app-id");
        assert_eq!(query["redirect_uri"], "http://localhost:8080/auth/callback");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "openid read_api");
        assert_eq!(query["state"], "state-123");
    }

    #[test]
    fn test_invalid_auth_url_is_a_config_error() {
        let mut client = test_client();
        client.config.auth_url = "not a url".into();
        assert!(client.authorization_url("s").is_err());
    }

    #[test]
    fn test_token_expiry_derived_from_expires_in() {
        let token = OAuth2Client::token_from_response(TokenResponse {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            expires_in: Some(7200),
            refresh_token: Some("rt".into()),
            id_token: None,
            scope: None,
        });

        assert!(!token.is_expired());
        assert!(!token.will_expire_soon());
        let expires_at = token.expires_at.unwrap();
        assert!(expires_at > Utc::now() + Duration::minutes(100));
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = OAuth2Client::token_from_response(TokenResponse {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            expires_in: None,
            refresh_token: None,
            id_token: None,
            scope: None,
        });
        assert!(!token.is_expired());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 512), "ok");
    }
}
