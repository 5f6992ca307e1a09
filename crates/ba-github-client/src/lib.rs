// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! GitHub REST API client for the branch archiver
//!
//! Covers the handful of endpoints the archiver needs: ref existence checks,
//! tag creation, branch deletion, and paginated listings of branches, tags,
//! repositories and organizations. The client never stores a credential;
//! each call receives the caller's bearer token.

pub mod auth;
pub mod client;
pub mod error;
pub mod network_config;
pub mod pagination;

pub use client::*;
pub use error::*;
pub use network_config::GitHubConfig;
pub use pagination::{PageCursor, Paginator, has_next_page};
