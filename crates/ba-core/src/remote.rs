// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Remote repository client abstraction
//!
//! The orchestrator talks to the hosting service only through
//! [`RemoteRepositoryClient`]. Implementations carry no credential of their
//! own; the caller's credential is passed on every call.

use async_trait::async_trait;
use ba_domain_types::{Branch, Credential, Listing, RepoRef, Tag};

/// Error surfaced by a remote client implementation
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteRepositoryClient: Send + Sync {
    /// `true` only when the tag is known to exist; a missing tag is `false`
    /// and every other response is an error.
    async fn tag_exists(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
    ) -> RemoteResult<bool>;

    async fn create_tag(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
        sha: &str,
    ) -> RemoteResult<()>;

    async fn delete_branch_ref(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<()>;

    /// Current head commit of `branch`
    async fn branch_head_sha(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<String>;

    async fn list_branches(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> RemoteResult<Listing<Branch>>;

    async fn list_tags(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> RemoteResult<Listing<Tag>>;
}
