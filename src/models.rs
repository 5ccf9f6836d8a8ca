// ABOUTME: View models handed to the rendering step
// ABOUTME: Plain serializable records assembled from provider responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # View Models
//!
//! Plain data records assembled from remote API responses. Each record lives
//! for exactly one response render; nothing here persists.

use crate::gitlab::ActivityEvent;
use serde::{Deserialize, Serialize};

/// Profile view: ID-token identity claims merged with the provider's
/// last-activity timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    /// Subject identifier from the ID token
    pub subject: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Last activity date reported by the provider (ISO date)
    pub last_activity_on: Option<String>,
}

/// Paginated activity feed view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesView {
    pub activities: Vec<ActivityEvent>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// One project inside a group listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    pub name: String,
    pub web_url: Option<String>,
    pub last_activity_at: Option<String>,
    /// Head commit of the default branch, when the repository is non-empty
    pub last_commit_sha: Option<String>,
}

/// One group with its most recent projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub name: String,
    pub full_path: String,
    pub web_url: Option<String>,
    pub projects: Vec<ProjectView>,
}

/// Group/project tree view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsView {
    pub groups: Vec<GroupView>,
}

/// Home view shown right after login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeView {
    pub username: Option<String>,
    pub sections: Vec<String>,
}
