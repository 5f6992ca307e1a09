// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Conflict detection against existing archive tags

use ba_domain_types::{Credential, RepoRef, derive_tag_name};
use futures::future::try_join_all;

use crate::Result;
use crate::error::Error;
use crate::remote::RemoteRepositoryClient;

/// Branches whose derived archive tag already exists, in input order.
///
/// All existence checks run concurrently. The first failing check fails the
/// whole detection with [`Error::ConflictCheckFailed`] and drops the checks
/// still pending.
pub async fn detect_conflicts<C>(
    client: &C,
    credential: &Credential,
    repo: &RepoRef,
    branches: &[String],
    tag_prefix: &str,
) -> Result<Vec<String>>
where
    C: RemoteRepositoryClient + ?Sized,
{
    if branches.is_empty() {
        return Ok(Vec::new());
    }

    let checks = branches.iter().map(|branch| async move {
        let tag_name = derive_tag_name(tag_prefix, branch);
        match client.tag_exists(credential, repo, &tag_name).await {
            Ok(exists) => {
                tracing::debug!(branch = %branch, tag = %tag_name, exists, "Checked archive tag");
                Ok(exists.then(|| branch.clone()))
            }
            Err(e) => Err(Error::ConflictCheckFailed {
                branch: branch.clone(),
                batch: branches.to_vec(),
                message: e.to_string(),
            }),
        }
    });

    let found = try_join_all(checks).await?;
    Ok(found.into_iter().flatten().collect())
}
