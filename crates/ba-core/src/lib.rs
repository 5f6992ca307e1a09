// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Branch lifecycle orchestration for the branch archiver.
//!
//! A batch of selected branches passes the confirmation gate, then the
//! orchestrator checks for colliding archive tags, tags and/or deletes every
//! branch through a [`RemoteRepositoryClient`], and returns one outcome per
//! branch. The reporter turns outcomes into messages and prunes the working
//! set.

pub mod conflict;
pub mod error;
pub mod gate;
pub mod github;
pub mod orchestrator;
pub mod remote;
pub mod reporter;
pub mod session;
pub mod working_set;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

/// Core result type used throughout the orchestrator
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub use conflict::detect_conflicts;
pub use gate::{
    AuthorizedRequest, admit, authorize, confirm, confirmation_phrase, pass_through,
    requires_confirmation,
};
pub use orchestrator::{
    BatchState, CANCELLED_BEFORE_START, DEFAULT_MAX_CONCURRENCY, LifecycleOrchestrator,
};
pub use remote::{RemoteError, RemoteRepositoryClient, RemoteResult};
pub use reporter::{Summary, describe, prune, summarize};
pub use session::{ArchiveSession, BatchReport};
pub use working_set::{SelectionError, WorkingSet};

/// Re-export domain types
pub use ba_domain_types::*;
