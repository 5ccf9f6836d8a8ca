// ABOUTME: GitLab provider clients over the GraphQL and REST APIs
// ABOUTME: Stateless wrappers normalizing provider responses and failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # GitLab API Clients
//!
//! Thin, stateless wrappers over the provider's GraphQL and REST endpoints.
//! Both clients share the configured outbound `reqwest::Client` (and with it
//! the outbound timeout) and normalize every failure mode — network error,
//! non-2xx status, GraphQL error payload — into [`crate::errors::AppError`]
//! so the centralized responder can classify it.

pub mod graphql;
pub mod rest;

pub use graphql::GraphqlClient;
pub use rest::{ActivityEvent, RestClient};
