// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Batch-level errors
//!
//! Every variant aborts a whole batch before any remote mutation, except
//! `ConfirmationMismatch`, which stops the request before it is dispatched.
//! Per-branch failures are not errors: they are failed
//! [`BranchOutcome`](ba_domain_types::BranchOutcome)s inside an `Ok` result.

use ba_domain_types::{DomainError, TagNameCollision};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("No credential supplied; set a GitHub token before running a batch")]
    AuthenticationMissing,

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    #[error("Branches would share an archive tag name: {}", join_collisions(.0))]
    AmbiguousTagNames(Vec<TagNameCollision>),

    #[error("Branches already being processed by another batch: {}", .branches.join(", "))]
    Busy { branches: Vec<String> },

    #[error("Conflict check failed for branch '{branch}': {message}")]
    ConflictCheckFailed {
        branch: String,
        /// Every branch of the blocked batch
        batch: Vec<String>,
        message: String,
    },

    #[error("Cannot process: tags already exist for branches: {}", .branches.join(", "))]
    TagCollision { branches: Vec<String> },

    #[error("Confirmation phrase mismatch: type '{expected}' to proceed")]
    ConfirmationMismatch { expected: String },

    #[error("Failed to list branches of {repo}: {message}")]
    ListingFailed { repo: String, message: String },
}

fn join_collisions(collisions: &[TagNameCollision]) -> String {
    collisions.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_branches() {
        let err = Error::TagCollision {
            branches: vec!["feature/x".to_string(), "old".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Cannot process: tags already exist for branches: feature/x, old"
        );

        let err = Error::AmbiguousTagNames(vec![TagNameCollision {
            tag_name: "archive/a-b".to_string(),
            branches: vec!["a/b".to_string(), "a-b".to_string()],
        }]);
        assert_eq!(
            err.to_string(),
            "Branches would share an archive tag name: archive/a-b <- a/b, a-b"
        );

        let err: Error = DomainError::NoBranches.into();
        assert!(matches!(err, Error::InvalidRequest(DomainError::NoBranches)));
    }
}
