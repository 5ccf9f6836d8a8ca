// ABOUTME: Profile view assembly from ID-token claims and provider activity data
// ABOUTME: Merges a local claims decode with one GraphQL last-activity query
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use crate::gitlab::GraphqlClient;
use crate::models::ProfileView;
use crate::oauth::id_token;
use crate::session::SessionUser;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const LAST_ACTIVITY_QUERY: &str = r"
query {
  currentUser {
    lastActivityOn
  }
}
";

#[derive(Debug, Deserialize)]
struct LastActivityData {
    #[serde(rename = "currentUser")]
    current_user: Option<CurrentUser>,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(rename = "lastActivityOn")]
    last_activity_on: Option<String>,
}

/// Profile service: identity claims come from the session's ID token (no
/// network call); the last-activity timestamp comes from one GraphQL query.
pub struct ProfileService {
    graphql: Arc<GraphqlClient>,
}

impl ProfileService {
    #[must_use]
    pub fn new(graphql: Arc<GraphqlClient>) -> Self {
        Self { graphql }
    }

    /// Assemble the profile view for an authenticated session
    ///
    /// # Errors
    ///
    /// Returns an error if the session carries no ID token, the claims do
    /// not decode, or the GraphQL query fails.
    pub async fn profile(&self, user: &SessionUser) -> AppResult<ProfileView> {
        let id_token = user
            .id_token
            .as_deref()
            .ok_or_else(|| AppError::auth_invalid("session carries no ID token"))?;
        let claims = id_token::decode_claims(id_token)?;

        let data = self
            .graphql
            .query(&user.access_token, LAST_ACTIVITY_QUERY, serde_json::json!({}))
            .await?;
        let last_activity = serde_json::from_value::<LastActivityData>(data)
            .map_err(|e| {
                warn!("unexpected last-activity payload shape: {e}");
                AppError::external_service("GitLab GraphQL", "unexpected last-activity payload")
            })?
            .current_user
            .and_then(|user| user.last_activity_on);

        Ok(ProfileView {
            subject: claims.sub,
            email: claims.email,
            username: claims.preferred_username,
            display_name: claims.name,
            avatar_url: claims.picture,
            last_activity_on: last_activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_activity_payload_parses() {
        let data: LastActivityData = serde_json::from_value(serde_json::json!({
            "currentUser": {"lastActivityOn": "2025-06-01"}
        }))
        .unwrap();
        assert_eq!(
            data.current_user.unwrap().last_activity_on.as_deref(),
            Some("2025-06-01")
        );
    }

    #[test]
    fn test_last_activity_payload_tolerates_null_user() {
        let data: LastActivityData =
            serde_json::from_value(serde_json::json!({ "currentUser": null })).unwrap();
        assert!(data.current_user.is_none());
    }
}
