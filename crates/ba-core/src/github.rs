// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! [`RemoteRepositoryClient`] backed by the GitHub REST API

use async_trait::async_trait;
use ba_domain_types::{Branch, Credential, Listing, RepoRef, Tag};
use ba_github_client::GitHubClient;

use crate::remote::{RemoteRepositoryClient, RemoteResult};

#[async_trait]
impl RemoteRepositoryClient for GitHubClient {
    async fn tag_exists(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
    ) -> RemoteResult<bool> {
        Ok(GitHubClient::tag_exists(self, credential, repo, tag_name).await?)
    }

    async fn create_tag(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        tag_name: &str,
        sha: &str,
    ) -> RemoteResult<()> {
        Ok(GitHubClient::create_tag(self, credential, repo, tag_name, sha).await?)
    }

    async fn delete_branch_ref(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<()> {
        Ok(GitHubClient::delete_branch_ref(self, credential, repo, branch).await?)
    }

    async fn branch_head_sha(
        &self,
        credential: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<String> {
        Ok(GitHubClient::branch_head_sha(self, credential, repo, branch).await?)
    }

    async fn list_branches(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> RemoteResult<Listing<Branch>> {
        Ok(GitHubClient::list_branches(self, credential, repo).await?)
    }

    async fn list_tags(
        &self,
        credential: &Credential,
        repo: &RepoRef,
    ) -> RemoteResult<Listing<Tag>> {
        Ok(GitHubClient::list_tags(self, credential, repo).await?)
    }
}
