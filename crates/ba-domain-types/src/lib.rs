// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types for the branch archiver
//!
//! This crate contains the types shared by the GitHub client, the lifecycle
//! orchestrator and the CLI: branches and tags as the hosting service reports
//! them, operation requests, per-branch outcomes and the archive tag naming
//! rule.
//!
//! These types are transport-agnostic; the wire shapes of branches and tags
//! happen to match the GitHub REST API so they deserialize directly.

pub mod credential;
pub mod error;
pub mod operation;
pub mod repository;

// Re-export commonly used types
pub use credential::Credential;
pub use error::DomainError;
pub use operation::*;
pub use repository::*;
