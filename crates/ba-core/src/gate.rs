// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Confirmation gate for destructive operations
//!
//! Any mode that deletes branches must be confirmed by typing a mode-specific
//! phrase. The orchestrator only accepts an [`AuthorizedRequest`], and this
//! module is the only place one can be built.

use ba_domain_types::{OperationMode, OperationRequest};

use crate::Result;
use crate::error::Error;

/// Whether `mode` needs a typed confirmation before dispatch
pub fn requires_confirmation(mode: OperationMode) -> bool {
    mode.deletes()
}

/// Phrase the operator must type to confirm `mode`
pub fn confirmation_phrase(mode: OperationMode) -> &'static str {
    match mode {
        OperationMode::ArchiveOnly => "archive",
        OperationMode::ArchiveAndDelete => "archive-delete",
        OperationMode::DeleteOnly => "delete",
    }
}

/// Case-sensitive exact comparison against the phrase for `mode`
pub fn authorize(mode: OperationMode, typed: &str) -> bool {
    typed == confirmation_phrase(mode)
}

/// A request that has passed the confirmation gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedRequest {
    request: OperationRequest,
}

impl AuthorizedRequest {
    pub fn request(&self) -> &OperationRequest {
        &self.request
    }

    pub fn into_request(self) -> OperationRequest {
        self.request
    }
}

/// Confirm `pending` with the phrase the operator typed.
///
/// The expected phrase is derived from the pending request's own mode at the
/// time of confirmation, so a phrase typed for one mode never authorizes
/// another.
pub fn confirm(pending: OperationRequest, typed: &str) -> Result<AuthorizedRequest> {
    if authorize(pending.mode, typed) {
        tracing::debug!(mode = %pending.mode, "Operation confirmed");
        Ok(AuthorizedRequest { request: pending })
    } else {
        Err(Error::ConfirmationMismatch {
            expected: confirmation_phrase(pending.mode).to_string(),
        })
    }
}

/// Authorize a request that needs no confirmation.
///
/// Destructive requests are refused with the phrase they would need.
pub fn pass_through(request: OperationRequest) -> Result<AuthorizedRequest> {
    if requires_confirmation(request.mode) {
        return Err(Error::ConfirmationMismatch {
            expected: confirmation_phrase(request.mode).to_string(),
        });
    }
    Ok(AuthorizedRequest { request })
}

/// Authorize through whichever path `request.mode` needs; `typed` is only
/// consulted for destructive modes.
pub fn admit(request: OperationRequest, typed: Option<&str>) -> Result<AuthorizedRequest> {
    if requires_confirmation(request.mode) {
        confirm(request, typed.unwrap_or_default())
    } else {
        pass_through(request)
    }
}
