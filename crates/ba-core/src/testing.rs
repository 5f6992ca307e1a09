// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory remote client for tests
//!
//! Holds branches and tags in memory, counts calls, records mutating calls in
//! order, and lets tests inject per-branch latency and failures. Latency
//! uses `tokio::time`, so tests can run with a paused clock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ba_domain_types::{Branch, Credential, Listing, RepoRef, Tag};

use crate::remote::{RemoteRepositoryClient, RemoteResult};

/// Where an injected failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `tag_exists`, keyed by tag name
    TagCheck,
    /// `branch_head_sha`, keyed by branch name
    HeadLookup,
    /// `create_tag`, keyed by tag name
    CreateTag,
    /// `delete_branch_ref`, keyed by branch name
    DeleteBranch,
}

/// A call that reached the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    TagExists(String),
    BranchHeadSha(String),
    CreateTag { tag: String, sha: String },
    DeleteBranch(String),
}

impl RemoteCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::CreateTag { .. } | Self::DeleteBranch(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub tag_exists: usize,
    pub branch_head_sha: usize,
    pub create_tag: usize,
    pub delete_branch_ref: usize,
    pub list_branches: usize,
    pub list_tags: usize,
}

impl CallCounts {
    pub fn mutations(&self) -> usize {
        self.create_tag + self.delete_branch_ref
    }
}

#[derive(Debug, Default)]
struct MockState {
    branches: Vec<Branch>,
    tags: Vec<Tag>,
    latencies: HashMap<String, Duration>,
    failures: HashMap<(FailurePoint, String), String>,
    calls: CallCounts,
    log: Vec<RemoteCall>,
}

#[derive(Debug, Default)]
pub struct MockRemoteClient {
    state: Mutex<MockState>,
}

impl MockRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add unprotected branches, each with a SHA derived from its name
    pub fn with_branches<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.state().branches.extend(
            names.into_iter().map(|name| Branch::new(name, format!("sha-{}", name))),
        );
        self
    }

    pub fn with_branch(self, branch: Branch) -> Self {
        self.state().branches.push(branch);
        self
    }

    pub fn with_tag(self, name: &str) -> Self {
        self.state().tags.push(Tag::new(name, format!("sha-{}", name)));
        self
    }

    /// Delay head lookups and deletions of `branch`
    pub fn with_latency(self, branch: &str, latency: Duration) -> Self {
        self.state().latencies.insert(branch.to_string(), latency);
        self
    }

    /// Make the call at `point` for `key` fail with `message`
    pub fn with_failure(self, point: FailurePoint, key: &str, message: &str) -> Self {
        self.state()
            .failures
            .insert((point, key.to_string()), message.to_string());
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn log(&self) -> Vec<RemoteCall> {
        self.state().log.clone()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.state().branches.iter().map(|b| b.name.clone()).collect()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.state().tags.iter().map(|t| t.name.clone()).collect()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn injected_failure(&self, point: FailurePoint, key: &str) -> RemoteResult<()> {
        match self.state().failures.get(&(point, key.to_string())) {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn delay_for(&self, branch: &str) {
        let latency = self.state().latencies.get(branch).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteRepositoryClient for MockRemoteClient {
    async fn tag_exists(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
        tag_name: &str,
    ) -> RemoteResult<bool> {
        {
            let mut state = self.state();
            state.calls.tag_exists += 1;
            state.log.push(RemoteCall::TagExists(tag_name.to_string()));
        }
        self.injected_failure(FailurePoint::TagCheck, tag_name)?;
        Ok(self.state().tags.iter().any(|t| t.name == tag_name))
    }

    async fn create_tag(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
        tag_name: &str,
        sha: &str,
    ) -> RemoteResult<()> {
        {
            let mut state = self.state();
            state.calls.create_tag += 1;
            state.log.push(RemoteCall::CreateTag {
                tag: tag_name.to_string(),
                sha: sha.to_string(),
            });
        }
        self.injected_failure(FailurePoint::CreateTag, tag_name)?;

        let mut state = self.state();
        if state.tags.iter().any(|t| t.name == tag_name) {
            return Err("Reference already exists".into());
        }
        state.tags.push(Tag::new(tag_name, sha));
        Ok(())
    }

    async fn delete_branch_ref(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<()> {
        {
            let mut state = self.state();
            state.calls.delete_branch_ref += 1;
            state.log.push(RemoteCall::DeleteBranch(branch.to_string()));
        }
        self.delay_for(branch).await;
        self.injected_failure(FailurePoint::DeleteBranch, branch)?;

        let mut state = self.state();
        let before = state.branches.len();
        state.branches.retain(|b| b.name != branch);
        if state.branches.len() == before {
            return Err("Reference does not exist".into());
        }
        Ok(())
    }

    async fn branch_head_sha(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
        branch: &str,
    ) -> RemoteResult<String> {
        {
            let mut state = self.state();
            state.calls.branch_head_sha += 1;
            state.log.push(RemoteCall::BranchHeadSha(branch.to_string()));
        }
        self.delay_for(branch).await;
        self.injected_failure(FailurePoint::HeadLookup, branch)?;

        self.state()
            .branches
            .iter()
            .find(|b| b.name == branch)
            .map(|b| b.commit.sha.clone())
            .ok_or_else(|| "Branch not found".into())
    }

    async fn list_branches(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
    ) -> RemoteResult<Listing<Branch>> {
        let mut state = self.state();
        state.calls.list_branches += 1;
        Ok(Listing::complete(state.branches.clone()))
    }

    async fn list_tags(
        &self,
        _credential: &Credential,
        _repo: &RepoRef,
    ) -> RemoteResult<Listing<Tag>> {
        let mut state = self.state();
        state.calls.list_tags += 1;
        Ok(Listing::complete(state.tags.clone()))
    }
}
