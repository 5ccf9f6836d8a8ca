// ABOUTME: Group/project tree retrieval over the GraphQL API
// ABOUTME: Fetches up to 3 groups with up to 5 projects and their latest commit metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use crate::gitlab::GraphqlClient;
use crate::models::{GroupView, GroupsView, ProjectView};
use crate::session::SessionUser;
use serde::Deserialize;
use std::sync::Arc;

const GROUPS_QUERY: &str = r"
query {
  currentUser {
    groups(first: 3) {
      nodes {
        name
        fullPath
        webUrl
        projects(first: 5, includeSubgroups: false) {
          nodes {
            name
            webUrl
            lastActivityAt
            repository {
              tree {
                lastCommitSha
              }
            }
          }
        }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct GroupsData {
    #[serde(rename = "currentUser")]
    current_user: Option<RawCurrentUser>,
}

#[derive(Debug, Deserialize)]
struct RawCurrentUser {
    groups: Option<NodeList<RawGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct NodeList<T> {
    #[serde(default)]
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: String,
    #[serde(rename = "fullPath")]
    full_path: String,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    projects: Option<NodeList<RawProject>>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: String,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    #[serde(rename = "lastActivityAt")]
    last_activity_at: Option<String>,
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    tree: Option<RawTree>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    #[serde(rename = "lastCommitSha")]
    last_commit_sha: Option<String>,
}

/// Group/project tree service over the GraphQL API
pub struct GroupsService {
    graphql: Arc<GraphqlClient>,
}

impl GroupsService {
    #[must_use]
    pub fn new(graphql: Arc<GraphqlClient>) -> Self {
        Self { graphql }
    }

    /// Fetch the group/project tree for an authenticated session
    ///
    /// # Errors
    ///
    /// Returns an error if the GraphQL query fails or the payload shape is
    /// unexpected.
    pub async fn groups(&self, user: &SessionUser) -> AppResult<GroupsView> {
        let data = self
            .graphql
            .query(&user.access_token, GROUPS_QUERY, serde_json::json!({}))
            .await?;

        let parsed: GroupsData = serde_json::from_value(data).map_err(|e| {
            AppError::external_service("GitLab GraphQL", format!("unexpected groups payload: {e}"))
                .with_source(e)
        })?;

        let groups = parsed
            .current_user
            .and_then(|user| user.groups)
            .map(|list| list.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(group_view)
            .collect();

        Ok(GroupsView { groups })
    }
}

fn group_view(raw: RawGroup) -> GroupView {
    GroupView {
        name: raw.name,
        full_path: raw.full_path,
        web_url: raw.web_url,
        projects: raw
            .projects
            .map(|list| list.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(project_view)
            .collect(),
    }
}

fn project_view(raw: RawProject) -> ProjectView {
    ProjectView {
        name: raw.name,
        web_url: raw.web_url,
        last_activity_at: raw.last_activity_at,
        last_commit_sha: raw
            .repository
            .and_then(|repo| repo.tree)
            .and_then(|tree| tree.last_commit_sha),
    }
}
