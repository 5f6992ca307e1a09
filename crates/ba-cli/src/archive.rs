// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `ba archive`: select branches, confirm, run one batch

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use ba_core::{
    ArchiveSession, AuthorizedRequest, BatchReport, OperationRequest, RemoteRepositoryClient,
    confirm, confirmation_phrase, pass_through, requires_confirmation,
};
use ba_domain_types::{OperationMode, RepoRef};
use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::output::{write_json, write_truncation_notice};
use crate::settings::ArchiveSettings;

#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Repository as OWNER/NAME
    pub repo: RepoRef,

    /// What to do with every selected branch
    #[arg(long, short = 'm', value_enum)]
    pub mode: OperationMode,

    /// Archive tag prefix; tags are named PREFIX/BRANCH
    #[arg(long)]
    pub prefix: Option<String>,

    /// Branch to process; repeat to select several
    #[arg(
        long = "branch",
        short = 'b',
        value_name = "BRANCH",
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub branches: Vec<String>,

    /// Select every unprotected branch
    #[arg(long)]
    pub all: bool,

    /// Confirmation phrase for deleting modes; prompted for when omitted
    #[arg(long, value_name = "PHRASE")]
    pub confirm: Option<String>,

    /// Branches processed at the same time
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Print the batch result as JSON
    #[arg(long)]
    pub json: bool,
}

impl ArchiveArgs {
    /// Apply `--prefix` and `--max-concurrency` over loaded settings
    pub fn apply_to(&self, settings: &mut ArchiveSettings) {
        if let Some(prefix) = &self.prefix {
            settings.tag_prefix = prefix.clone();
        }
        if let Some(max) = self.max_concurrency {
            settings.max_concurrency = max;
        }
    }
}

/// Terminal streams used by the archive flow
pub struct Console<'a> {
    pub input: &'a mut dyn BufRead,
    pub out: &'a mut dyn Write,
    /// Prompts and notices; keeps `out` clean for `--json`
    pub err: &'a mut dyn Write,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [ba_domain_types::BranchOutcome],
    remaining: usize,
}

/// Select the requested branches in a freshly loaded session
pub fn select_branches<C>(args: &ArchiveArgs, session: &mut ArchiveSession<C>) -> Result<usize>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    let working_set = session.working_set_mut();
    if args.all {
        return Ok(working_set.select_all());
    }
    for name in &args.branches {
        working_set.select(name)?;
    }
    Ok(working_set.selected_count())
}

/// Pass the request through the confirmation gate, prompting when needed
pub fn authorize_request(
    request: OperationRequest,
    typed: Option<&str>,
    repo: &RepoRef,
    console: &mut Console<'_>,
) -> Result<AuthorizedRequest> {
    if !requires_confirmation(request.mode) {
        return Ok(pass_through(request)?);
    }

    let phrase = match typed {
        Some(phrase) => phrase.to_string(),
        None => prompt_for_phrase(&request, repo, console)?,
    };
    Ok(confirm(request, &phrase)?)
}

fn prompt_for_phrase(
    request: &OperationRequest,
    repo: &RepoRef,
    console: &mut Console<'_>,
) -> Result<String> {
    let err = &mut *console.err;
    writeln!(
        err,
        "About to {} {} branch(es) of {}:",
        request.mode,
        request.branches.len(),
        repo
    )?;
    for branch in &request.branches {
        if request.mode.archives() {
            writeln!(err, "  {} -> {}", branch, request.tag_name_for(branch))?;
        } else {
            writeln!(err, "  {}", branch)?;
        }
    }
    write!(
        err,
        "Type '{}' to confirm: ",
        confirmation_phrase(request.mode)
    )?;
    err.flush()?;

    let mut line = String::new();
    console
        .input
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Select branches, build the request and pass it through the gate.
///
/// Nothing is sent to the remote before this returns `Ok`.
pub fn prepare_batch<C>(
    args: &ArchiveArgs,
    session: &mut ArchiveSession<C>,
    tag_prefix: &str,
    console: &mut Console<'_>,
) -> Result<AuthorizedRequest>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    if session.is_truncated() {
        write_truncation_notice(&mut *console.err, "branch")?;
    }

    let selected = select_branches(args, session)?;
    tracing::info!(repo = %session.repo(), mode = %args.mode, selected, "Branches selected");

    let request = session.prepare(args.mode, tag_prefix)?;
    let repo = session.repo().clone();
    authorize_request(request, args.confirm.as_deref(), &repo, console)
}

/// Run an authorized batch and print its outcome.
///
/// Batch-fatal errors are returned as `Err`; per-branch failures are in the
/// returned report.
pub async fn execute_batch<C>(
    args: &ArchiveArgs,
    session: &mut ArchiveSession<C>,
    authorized: AuthorizedRequest,
    console: &mut Console<'_>,
    cancel: CancellationToken,
) -> Result<BatchReport>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    let report = session.run(authorized, cancel).await?;
    let remaining = session.working_set().len();

    if args.json {
        write_json(
            &mut *console.out,
            &JsonReport {
                results: &report.batch.results,
                remaining,
            },
        )?;
        return Ok(report);
    }

    let out = &mut *console.out;
    if !report.summary.success_messages.is_empty() {
        writeln!(out, "Succeeded:")?;
        for message in &report.summary.success_messages {
            writeln!(out, "  {}", message)?;
        }
    }
    if !report.summary.failure_messages.is_empty() {
        writeln!(out, "Failed:")?;
        for message in &report.summary.failure_messages {
            writeln!(out, "  {}", message)?;
        }
    }
    writeln!(out, "{} branch(es) remaining in {}", remaining, session.repo())?;
    Ok(report)
}

/// [`prepare_batch`] followed by [`execute_batch`]
pub async fn run_archive<C>(
    args: &ArchiveArgs,
    session: &mut ArchiveSession<C>,
    tag_prefix: &str,
    console: &mut Console<'_>,
    cancel: CancellationToken,
) -> Result<BatchReport>
where
    C: RemoteRepositoryClient + ?Sized + 'static,
{
    let authorized = prepare_batch(args, session, tag_prefix, console)?;
    execute_batch(args, session, authorized, console, cancel).await
}
