// ABOUTME: GraphQL client for the GitLab API with bearer-token authentication
// ABOUTME: Normalizes transport failures and GraphQL error payloads into AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::environment::GitLabConfig;
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;

/// GraphQL client over the provider's `/api/graphql` endpoint
pub struct GraphqlClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl GraphqlClient {
    #[must_use]
    pub fn new(config: &GitLabConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: config.graphql_url(),
            client,
        }
    }

    /// Execute a query and return the `data` payload
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider responds with a
    /// non-2xx status, or the response carries a GraphQL error payload.
    pub async fn query(
        &self,
        access_token: &str,
        query: &str,
        variables: Value,
    ) -> AppResult<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("GitLab GraphQL", format!("request failed: {e}"))
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
                "GitLab GraphQL",
                format!("unexpected status {status}"),
            )
            .with_details(serde_json::json!({ "status": status.as_u16() })));
        }

        let body: GraphqlResponse = response.json().await.map_err(|e| {
            AppError::external_service("GitLab GraphQL", format!("malformed response: {e}"))
                .with_source(e)
        })?;

        if let Some(first) = body.errors.first() {
            return Err(AppError::external_service(
                "GitLab GraphQL",
                format!("query rejected: {}", first.message),
            )
            .with_details(serde_json::json!({
                "errors": body.errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>(),
            })));
        }

        body.data.ok_or_else(|| {
            AppError::external_service("GitLab GraphQL", "response carried no data")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_derived_from_base_url() {
        let client = GraphqlClient::new(
            &GitLabConfig {
                base_url: "https://git.example.com".into(),
            },
            reqwest::Client::new(),
        );
        assert_eq!(client.endpoint, "https://git.example.com/api/graphql");
    }

    #[test]
    fn test_graphql_response_parses_error_payload() {
        let body: GraphqlResponse = serde_json::from_str(
            r#"{"errors":[{"message":"field does not exist"}],"data":null}"#,
        )
        .unwrap();
        assert_eq!(body.errors.len(), 1);
        assert!(body.data.is_none());
    }
}
