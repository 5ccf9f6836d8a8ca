// ABOUTME: Activity feed retrieval with pagination defaults and page clamping
// ABOUTME: Wraps the REST events endpoint into the paginated activities view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::AppResult;
use crate::gitlab::RestClient;
use crate::models::ActivitiesView;
use crate::session::SessionUser;
use std::sync::Arc;

/// The events feed is capped at the provider's retention horizon; the page
/// ceiling is derived from this fixed count rather than a count query.
const TOTAL_ACTIVITY_COUNT: u32 = 120;

/// Default page when the query omits one
const DEFAULT_PAGE: u32 = 1;
/// Default page size when the query omits one
const DEFAULT_LIMIT: u32 = 20;
/// Provider maximum for `per_page`
const MAX_LIMIT: u32 = 100;

/// Activity feed service over the REST events endpoint
pub struct ActivitiesService {
    rest: Arc<RestClient>,
}

impl ActivitiesService {
    #[must_use]
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self { rest }
    }

    /// Fetch one page of the activity feed.
    ///
    /// `page` and `limit` are optional query inputs; the limit is bounded to
    /// the provider maximum and the page is clamped to the derived ceiling
    /// so a request can never point past the feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn activities(
        &self,
        user: &SessionUser,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> AppResult<ActivitiesView> {
        let (page, limit, total_pages) = clamp_pagination(page, limit);

        let activities = self.rest.events(&user.access_token, page, limit).await?;

        Ok(ActivitiesView {
            activities,
            page,
            limit,
            total_pages,
        })
    }
}

/// Normalize pagination inputs: apply defaults, bound the limit, clamp the
/// page into `1..=ceil(TOTAL_ACTIVITY_COUNT / limit)`.
fn clamp_pagination(page: Option<u32>, limit: Option<u32>) -> (u32, u32, u32) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let total_pages = TOTAL_ACTIVITY_COUNT.div_ceil(limit);
    let page = page.unwrap_or(DEFAULT_PAGE).clamp(1, total_pages);
    (page, limit, total_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let (page, limit, total_pages) = clamp_pagination(None, None);
        assert_eq!(page, 1);
        assert_eq!(limit, 20);
        assert_eq!(total_pages, 6);
    }

    #[test]
    fn test_page_clamped_to_ceiling() {
        let (page, _, total_pages) = clamp_pagination(Some(99), Some(20));
        assert_eq!(total_pages, 6);
        assert_eq!(page, 6, "page never exceeds ceil(120/20)");
    }

    #[test]
    fn test_page_zero_clamped_to_first() {
        let (page, _, _) = clamp_pagination(Some(0), Some(20));
        assert_eq!(page, 1);
    }

    #[test]
    fn test_limit_bounded_to_provider_maximum() {
        let (_, limit, total_pages) = clamp_pagination(None, Some(500));
        assert_eq!(limit, 100);
        assert_eq!(total_pages, 2);
    }

    #[test]
    fn test_limit_zero_bumped_to_one() {
        let (_, limit, total_pages) = clamp_pagination(None, Some(0));
        assert_eq!(limit, 1);
        assert_eq!(total_pages, 120);
    }

    #[test]
    fn test_uneven_division_rounds_up() {
        let (_, _, total_pages) = clamp_pagination(None, Some(50));
        assert_eq!(total_pages, 3, "ceil(120/50)");
    }
}
