// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository-related domain types
//!
//! Types describing remote repositories and the refs inside them. Field names
//! follow the GitHub REST API so these deserialize straight from its payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Commit a ref points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CommitRef {
    pub fn new(sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            url: None,
        }
    }

    /// Abbreviated SHA as shown in listings
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// Branch information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
    /// Protected branches are never eligible for selection
    #[serde(default)]
    pub protected: bool,
}

impl Branch {
    pub fn new(name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: CommitRef::new(sha),
            protected: false,
        }
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn head_commit_sha(&self) -> &str {
        &self.commit.sha
    }
}

/// Tag information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: CommitRef,
}

impl Tag {
    pub fn new(name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: CommitRef::new(sha),
        }
    }
}

/// Account owning a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    /// `User` or `Organization`
    #[serde(rename = "type")]
    pub kind: String,
}

impl RepositoryOwner {
    pub fn is_user(&self) -> bool {
        self.kind == "User"
    }
}

/// Repository information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub default_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<RepositoryOwner>,
}

impl Repository {
    pub fn owner_login(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.login.as_str())
    }

    /// Case-insensitive substring match on the repository name
    pub fn matches_search(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Organization the authenticated user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// `OWNER/NAME` reference to a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| DomainError::InvalidRepoRef(s.to_string()))?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(DomainError::InvalidRepoRef(s.to_string()));
        }
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Items gathered from a paginated listing.
///
/// `truncated` is set when the page ceiling was reached while the upstream
/// still advertised more pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub truncated: bool,
}

impl<T> Listing<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_deserializes_from_github_payload() {
        let payload = r#"{
            "name": "feature/login",
            "commit": {"sha": "0123456789abcdef", "url": "https://api.github.com/x"},
            "protected": true
        }"#;
        let branch: Branch = serde_json::from_str(payload).unwrap();
        assert_eq!(branch.name, "feature/login");
        assert_eq!(branch.head_commit_sha(), "0123456789abcdef");
        assert_eq!(branch.commit.short_sha(), "0123456");
        assert!(branch.protected);
    }

    #[test]
    fn test_tag_payload_without_protection_field() {
        let payload = r#"{"name": "v1.0", "commit": {"sha": "abc"}}"#;
        let tag: Tag = serde_json::from_str(payload).unwrap();
        assert_eq!(tag.commit.short_sha(), "abc");
    }

    #[test]
    fn test_repo_ref_parsing() {
        let repo: RepoRef = "octo/widgets".parse().unwrap();
        assert_eq!(repo, RepoRef::new("octo", "widgets"));
        assert_eq!(repo.to_string(), "octo/widgets");

        assert!("octo".parse::<RepoRef>().is_err());
        assert!("/widgets".parse::<RepoRef>().is_err());
        assert!("octo/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }

    #[test]
    fn test_repository_search_is_case_insensitive() {
        let repo = Repository {
            id: 1,
            name: "Widget-Service".to_string(),
            full_name: "octo/Widget-Service".to_string(),
            clone_url: "https://github.com/octo/Widget-Service.git".to_string(),
            default_branch: "main".to_string(),
            owner: Some(RepositoryOwner {
                login: "octo".to_string(),
                kind: "Organization".to_string(),
            }),
        };
        assert!(repo.matches_search("widget"));
        assert!(!repo.matches_search("gadget"));
        assert_eq!(repo.owner_login(), Some("octo"));
        assert!(!repo.owner.as_ref().unwrap().is_user());
    }
}
