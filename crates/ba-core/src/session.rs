// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One operator's session against one repository
//!
//! Ties the working set to the orchestrator: the branch list is loaded from
//! the remote, the operator selects branches, a request built from the
//! selection goes through the confirmation gate, and a completed batch prunes
//! the working set. Batch-fatal errors leave the working set untouched.

use std::sync::Arc;

use ba_domain_types::{BatchResult, Credential, OperationMode, OperationRequest, RepoRef};
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::error::Error;
use crate::gate::AuthorizedRequest;
use crate::orchestrator::LifecycleOrchestrator;
use crate::remote::RemoteRepositoryClient;
use crate::reporter::{self, Summary};
use crate::working_set::WorkingSet;

pub struct ArchiveSession<C: ?Sized> {
    orchestrator: LifecycleOrchestrator<C>,
    credential: Option<Credential>,
    repo: RepoRef,
    working_set: WorkingSet,
    truncated: bool,
}

/// What a completed batch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch: BatchResult,
    pub summary: Summary,
}

impl<C> ArchiveSession<C>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    /// Session with an empty working set; call [`refresh`](Self::refresh) to load branches
    pub fn new(
        orchestrator: LifecycleOrchestrator<C>,
        credential: Option<Credential>,
        repo: RepoRef,
    ) -> Self {
        Self {
            orchestrator,
            credential: credential.filter(|c| !c.is_blank()),
            repo,
            working_set: WorkingSet::default(),
            truncated: false,
        }
    }

    /// Create a session and load the branch list
    pub async fn open(
        orchestrator: LifecycleOrchestrator<C>,
        credential: Option<Credential>,
        repo: RepoRef,
    ) -> Result<Self> {
        let mut session = Self::new(orchestrator, credential, repo);
        session.refresh().await?;
        Ok(session)
    }

    /// Reload the branch list from the remote, dropping every selection
    pub async fn refresh(&mut self) -> Result<()> {
        let credential = self.credential.as_ref().ok_or(Error::AuthenticationMissing)?;
        let listing = self
            .orchestrator
            .client()
            .list_branches(credential, &self.repo)
            .await
            .map_err(|e| Error::ListingFailed {
                repo: self.repo.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(repo = %self.repo, branches = listing.len(), truncated = listing.truncated, "Loaded branches");
        self.truncated = listing.truncated;
        self.working_set = WorkingSet::new(listing.items);
        Ok(())
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn working_set_mut(&mut self) -> &mut WorkingSet {
        &mut self.working_set
    }

    /// Whether the last branch listing hit the page ceiling
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Build a request from the current selection
    pub fn prepare(&self, mode: OperationMode, tag_prefix: &str) -> Result<OperationRequest> {
        Ok(OperationRequest::new(
            mode,
            self.working_set.selected_names(),
            tag_prefix,
        )?)
    }

    /// Execute an authorized batch and prune the working set on completion
    pub async fn run(
        &mut self,
        request: AuthorizedRequest,
        cancel: CancellationToken,
    ) -> Result<BatchReport> {
        let batch = self
            .orchestrator
            .execute_with_cancellation(self.credential.as_ref(), &self.repo, request, cancel)
            .await?;

        let summary = reporter::summarize(&batch);
        let working_set = std::mem::take(&mut self.working_set);
        self.working_set = reporter::prune(working_set, &batch);
        Ok(BatchReport { batch, summary })
    }

    pub fn orchestrator(&self) -> &LifecycleOrchestrator<C> {
        &self.orchestrator
    }

    pub fn client(&self) -> &Arc<C> {
        self.orchestrator.client()
    }
}
