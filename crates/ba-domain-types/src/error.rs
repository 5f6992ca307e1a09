// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for domain validation and parsing

use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid repository reference '{0}': expected OWNER/NAME")]
    InvalidRepoRef(String),

    #[error("Invalid operation mode: {0}")]
    InvalidMode(String),

    #[error("Operation request must name at least one branch")]
    NoBranches,

    #[error("Branch name must not be empty")]
    EmptyBranchName,

    #[error("Branch '{0}' appears more than once in the request")]
    DuplicateBranch(String),

    #[error("Tag prefix must not be empty")]
    EmptyTagPrefix,
}
