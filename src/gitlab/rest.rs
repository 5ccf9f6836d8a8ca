// ABOUTME: REST client for the GitLab events API with pagination parameters
// ABOUTME: Fetches the authenticated user's activity feed as lenient typed records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::environment::GitLabConfig;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the user's activity feed.
///
/// The provider's event schema varies by event kind, so every field beyond
/// the id is optional and unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub action_name: Option<String>,
    pub target_type: Option<String>,
    pub target_title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author_username: Option<String>,
}

/// REST client over the provider's `/api/v4` endpoints
pub struct RestClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestClient {
    #[must_use]
    pub fn new(config: &GitLabConfig, client: reqwest::Client) -> Self {
        Self {
            base_url: config.rest_base_url(),
            client,
        }
    }

    /// Fetch one page of the authenticated user's events
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider responds with a
    /// non-2xx status, or the payload does not parse.
    pub async fn events(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> AppResult<Vec<ActivityEvent>> {
        let response = self
            .client
            .get(format!("{}/events", self.base_url))
            .bearer_auth(access_token)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("GitLab REST", format!("request failed: {e}"))
                    .with_source(e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::external_auth_failed(
                "GitLab rejected the access token",
            ));
        }
        if !status.is_success() {
            return Err(AppError::external_service(
                "GitLab REST",
                format!("unexpected status {status}"),
            )
            .with_details(serde_json::json!({ "status": status.as_u16() })));
        }

        response.json().await.map_err(|e| {
            AppError::external_service("GitLab REST", format!("malformed events payload: {e}"))
                .with_source(e)
        })
    }
}
