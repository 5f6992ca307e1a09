// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Branch lifecycle orchestration
//!
//! One batch moves through these states:
//!
//! ```text
//! Idle -> ConflictChecking -> Blocked(conflicts)      archive mode, some tag exists
//!                          -> Executing -> Completed  delete-only, or no conflicts
//! ```
//!
//! `Blocked` is terminal and surfaces as [`Error::TagCollision`]. While
//! executing, every branch is processed independently and yields exactly one
//! [`BranchOutcome`]; outcomes keep the request's branch order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ba_domain_types::{
    BatchResult, BranchOutcome, Credential, OperationMode, OperationRequest, RepoRef,
    derive_tag_name, find_tag_name_collisions,
};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::Result;
use crate::conflict::detect_conflicts;
use crate::error::Error;
use crate::gate::AuthorizedRequest;
use crate::remote::RemoteRepositoryClient;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Error recorded for branches skipped because the batch was cancelled
pub const CANCELLED_BEFORE_START: &str = "cancelled before start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    ConflictChecking,
    Blocked(Vec<String>),
    Executing,
    Completed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Idle => write!(f, "idle"),
            BatchState::ConflictChecking => write!(f, "conflict-checking"),
            BatchState::Blocked(_) => write!(f, "blocked"),
            BatchState::Executing => write!(f, "executing"),
            BatchState::Completed => write!(f, "completed"),
        }
    }
}

type InFlight = Arc<Mutex<HashMap<RepoRef, HashSet<String>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Branches of one batch registered as in flight; released on drop.
///
/// Shared with every spawned per-branch task, so the branches stay claimed
/// until the last dispatched remote call has finished even if the caller
/// stops waiting.
struct InFlightClaim {
    registry: InFlight,
    repo: RepoRef,
    branches: Vec<String>,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if let Some(active) = registry.get_mut(&self.repo) {
            for branch in &self.branches {
                active.remove(branch);
            }
            if active.is_empty() {
                registry.remove(&self.repo);
            }
        }
    }
}

/// Executes authorized batches against a remote repository client
pub struct LifecycleOrchestrator<C: ?Sized> {
    client: Arc<C>,
    max_concurrency: usize,
    in_flight: InFlight,
}

impl<C: ?Sized> Clone for LifecycleOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            max_concurrency: self.max_concurrency,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<C> LifecycleOrchestrator<C>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            in_flight: InFlight::default(),
        }
    }

    /// Cap on branches processed at the same time (at least 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Whether `branch` of `repo` belongs to a batch still executing
    pub fn is_in_flight(&self, repo: &RepoRef, branch: &str) -> bool {
        lock(&self.in_flight)
            .get(repo)
            .is_some_and(|active| active.contains(branch))
    }

    pub async fn execute(
        &self,
        credential: Option<&Credential>,
        repo: &RepoRef,
        request: AuthorizedRequest,
    ) -> Result<BatchResult> {
        self.execute_with_cancellation(credential, repo, request, CancellationToken::new())
            .await
    }

    /// Run one batch.
    ///
    /// Batch-fatal conditions are checked in order before any remote call:
    /// missing credential, invalid request, ambiguous tag names (archive
    /// modes), overlap with a batch still executing. Once `cancel` fires,
    /// branches that have not started yet fail with
    /// [`CANCELLED_BEFORE_START`]; started ones run to completion.
    pub async fn execute_with_cancellation(
        &self,
        credential: Option<&Credential>,
        repo: &RepoRef,
        request: AuthorizedRequest,
        cancel: CancellationToken,
    ) -> Result<BatchResult> {
        let credential = credential
            .filter(|c| !c.is_blank())
            .cloned()
            .ok_or(Error::AuthenticationMissing)?;

        let request = request.into_request();
        request.validate()?;

        if request.mode.archives() {
            let collisions = find_tag_name_collisions(&request.tag_prefix, &request.branches);
            if !collisions.is_empty() {
                return Err(Error::AmbiguousTagNames(collisions));
            }
        }

        let claim = Arc::new(self.claim(repo, &request.branches)?);

        let span = tracing::info_span!(
            "batch",
            correlation_id = %ba_logging::correlation_id(),
            repo = %repo,
            mode = %request.mode,
            branches = request.branches.len(),
        );
        self.run_batch(credential, repo.clone(), request, claim, cancel)
            .instrument(span)
            .await
    }

    fn claim(&self, repo: &RepoRef, branches: &[String]) -> Result<InFlightClaim> {
        let mut registry = lock(&self.in_flight);
        let active = registry.entry(repo.clone()).or_default();

        let overlapping: Vec<String> =
            branches.iter().filter(|b| active.contains(*b)).cloned().collect();
        if !overlapping.is_empty() {
            tracing::warn!(repo = %repo, branches = ?overlapping, "Refusing overlapping batch");
            return Err(Error::Busy {
                branches: overlapping,
            });
        }

        active.extend(branches.iter().cloned());
        Ok(InFlightClaim {
            registry: Arc::clone(&self.in_flight),
            repo: repo.clone(),
            branches: branches.to_vec(),
        })
    }

    async fn run_batch(
        &self,
        credential: Credential,
        repo: RepoRef,
        request: OperationRequest,
        claim: Arc<InFlightClaim>,
        cancel: CancellationToken,
    ) -> Result<BatchResult> {
        let mut state = BatchState::Idle;
        transition(&mut state, BatchState::ConflictChecking);

        if request.mode.archives() {
            let conflicts = detect_conflicts(
                self.client.as_ref(),
                &credential,
                &repo,
                &request.branches,
                &request.tag_prefix,
            )
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Conflict detection failed"))?;

            if !conflicts.is_empty() {
                transition(&mut state, BatchState::Blocked(conflicts.clone()));
                tracing::warn!(branches = ?conflicts, "Archive tags already exist; batch blocked");
                return Err(Error::TagCollision {
                    branches: conflicts,
                });
            }
        }

        transition(&mut state, BatchState::Executing);

        let mode = request.mode;
        let credential = Arc::new(credential);
        let repo = Arc::new(repo);
        let tag_prefix: Arc<str> = Arc::from(request.tag_prefix.as_str());

        let results: Vec<BranchOutcome> = stream::iter(request.branches)
            .map(|branch| {
                let client = Arc::clone(&self.client);
                let credential = Arc::clone(&credential);
                let repo = Arc::clone(&repo);
                let tag_prefix = Arc::clone(&tag_prefix);
                let claim = Arc::clone(&claim);
                let cancel = cancel.clone();

                async move {
                    if cancel.is_cancelled() {
                        tracing::info!(branch = %branch, "Batch cancelled; branch not started");
                        return BranchOutcome::failed(branch, false, CANCELLED_BEFORE_START);
                    }

                    let task_branch = branch.clone();
                    let task = tokio::spawn(
                        async move {
                            let _claim = claim;
                            process_branch(
                                client.as_ref(),
                                &credential,
                                &repo,
                                mode,
                                &tag_prefix,
                                task_branch,
                            )
                            .await
                        }
                        .in_current_span(),
                    );

                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(branch = %branch, error = %e, "Branch task aborted");
                            BranchOutcome::failed(branch, false, format!("branch task aborted: {}", e))
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let batch = BatchResult::new(results);
        transition(&mut state, BatchState::Completed);
        tracing::info!(
            succeeded = batch.successes().count(),
            failed = batch.failures().count(),
            "Batch completed"
        );
        Ok(batch)
    }
}

fn transition(state: &mut BatchState, next: BatchState) {
    tracing::info!(from = %state, to = %next, "Batch state transition");
    *state = next;
}

/// Run one branch through the steps `mode` asks for.
///
/// Deletion after archiving only happens once the tag exists.
async fn process_branch<C>(
    client: &C,
    credential: &Credential,
    repo: &RepoRef,
    mode: OperationMode,
    tag_prefix: &str,
    branch: String,
) -> BranchOutcome
where
    C: RemoteRepositoryClient + ?Sized,
{
    let mut archived = false;

    if mode.archives() {
        let tag_name = derive_tag_name(tag_prefix, &branch);
        if let Err(message) = archive_branch(client, credential, repo, &branch, &tag_name).await {
            tracing::warn!(branch = %branch, tag = %tag_name, error = %message, "Archiving failed");
            return BranchOutcome::failed(branch, false, message);
        }
        tracing::info!(branch = %branch, tag = %tag_name, "Branch archived");
        archived = true;
    }

    if !mode.deletes() {
        return BranchOutcome::succeeded(branch, mode);
    }

    match client.delete_branch_ref(credential, repo, &branch).await {
        Ok(()) => {
            tracing::info!(branch = %branch, "Branch deleted");
            BranchOutcome::succeeded(branch, mode)
        }
        Err(e) => {
            tracing::warn!(branch = %branch, archived, error = %e, "Branch deletion failed");
            BranchOutcome::failed(branch, archived, format!("branch deletion failed: {}", e))
        }
    }
}

async fn archive_branch<C>(
    client: &C,
    credential: &Credential,
    repo: &RepoRef,
    branch: &str,
    tag_name: &str,
) -> std::result::Result<(), String>
where
    C: RemoteRepositoryClient + ?Sized,
{
    let sha = client
        .branch_head_sha(credential, repo, branch)
        .await
        .map_err(|e| format!("head lookup failed: {}", e))?;
    client
        .create_tag(credential, repo, tag_name, &sha)
        .await
        .map_err(|e| format!("tag creation failed: {}", e))
}
