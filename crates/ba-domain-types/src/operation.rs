// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Operation requests and per-branch outcomes
//!
//! An [`OperationRequest`] names a batch of branches and what to do with them;
//! the orchestrator answers with a [`BatchResult`] holding exactly one
//! [`BranchOutcome`] per requested branch, in request order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// What to do with each branch of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    /// Create an archive tag and keep the branch
    ArchiveOnly,
    /// Create an archive tag, then delete the branch
    ArchiveAndDelete,
    /// Delete the branch without tagging it
    DeleteOnly,
}

impl OperationMode {
    pub const ALL: [OperationMode; 3] = [
        OperationMode::ArchiveOnly,
        OperationMode::ArchiveAndDelete,
        OperationMode::DeleteOnly,
    ];

    pub fn archives(self) -> bool {
        matches!(self, Self::ArchiveOnly | Self::ArchiveAndDelete)
    }

    pub fn deletes(self) -> bool {
        matches!(self, Self::ArchiveAndDelete | Self::DeleteOnly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArchiveOnly => "archive-only",
            Self::ArchiveAndDelete => "archive-and-delete",
            Self::DeleteOnly => "delete-only",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DomainError::InvalidMode(s.to_string()))
    }
}

/// Canonical archive tag name for `branch` under `prefix`.
///
/// Every `/` in the branch name becomes `-`, so `feature/x` under `archive`
/// maps to `archive/feature-x`.
pub fn derive_tag_name(prefix: &str, branch: &str) -> String {
    format!("{}/{}", prefix, branch.replace('/', "-"))
}

/// Two or more branches of one batch that derive the same archive tag name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNameCollision {
    pub tag_name: String,
    pub branches: Vec<String>,
}

impl fmt::Display for TagNameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.tag_name, self.branches.join(", "))
    }
}

/// Group branches by derived tag name and report every group with more than one member.
///
/// Collisions are ordered by tag name; branches inside a collision keep their input order.
pub fn find_tag_name_collisions<S: AsRef<str>>(
    prefix: &str,
    branches: &[S],
) -> Vec<TagNameCollision> {
    let mut by_tag: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for branch in branches {
        let branch = branch.as_ref();
        by_tag
            .entry(derive_tag_name(prefix, branch))
            .or_default()
            .push(branch.to_string());
    }

    by_tag
        .into_iter()
        .filter(|(_, branches)| branches.len() > 1)
        .map(|(tag_name, branches)| TagNameCollision { tag_name, branches })
        .collect()
}

/// A batch of branches and the operation to apply to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub mode: OperationMode,
    pub branches: Vec<String>,
    pub tag_prefix: String,
}

impl OperationRequest {
    /// Build and validate a request
    pub fn new(
        mode: OperationMode,
        branches: Vec<String>,
        tag_prefix: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let request = Self {
            mode,
            branches,
            tag_prefix: tag_prefix.into(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Check the request invariants: at least one branch, no blank or duplicate
    /// branch names, and a non-empty tag prefix.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.branches.is_empty() {
            return Err(DomainError::NoBranches);
        }
        if self.tag_prefix.trim().is_empty() {
            return Err(DomainError::EmptyTagPrefix);
        }

        let mut seen = HashSet::with_capacity(self.branches.len());
        for branch in &self.branches {
            if branch.trim().is_empty() {
                return Err(DomainError::EmptyBranchName);
            }
            if !seen.insert(branch.as_str()) {
                return Err(DomainError::DuplicateBranch(branch.clone()));
            }
        }
        Ok(())
    }

    /// Archive tag name this request would create for `branch`
    pub fn tag_name_for(&self, branch: &str) -> String {
        derive_tag_name(&self.tag_prefix, branch)
    }
}

/// Result of processing one branch of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutcome {
    pub branch: String,
    pub archived: bool,
    pub deleted: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BranchOutcome {
    /// Successful outcome; the flags follow from the steps `mode` runs
    pub fn succeeded(branch: impl Into<String>, mode: OperationMode) -> Self {
        Self {
            branch: branch.into(),
            archived: mode.archives(),
            deleted: mode.deletes(),
            success: true,
            error: None,
        }
    }

    /// Failed outcome; `archived` records whether the tag was created before the failure
    pub fn failed(branch: impl Into<String>, archived: bool, error: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            archived,
            deleted: false,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Ordered outcomes of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<BranchOutcome>,
}

impl BatchResult {
    pub fn new(results: Vec<BranchOutcome>) -> Self {
        Self { results }
    }

    pub fn successes(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Split into (successes, failures), each keeping batch order
    pub fn partition(&self) -> (Vec<&BranchOutcome>, Vec<&BranchOutcome>) {
        self.results.iter().partition(|r| r.success)
    }

    pub fn deleted_branches(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter(|r| r.deleted).map(|r| r.branch.as_str())
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.success)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
