// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use ba_core::{ArchiveSession, Error as CoreError, LifecycleOrchestrator};
use ba_domain_types::Credential;
use ba_github_client::GitHubClient;
use ba_logging::CliLoggingArgs;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

pub mod archive;
pub mod output;
pub mod refs;
pub mod repos;
pub mod settings;

pub use clap::Parser;
pub use settings::Settings;

#[derive(clap::Parser, Debug)]
#[command(
    name = "ba",
    about = "Archive and delete GitHub branches in bulk",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file (default: <config dir>/branch-archiver/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long, global = true, env = "BA_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(flatten)]
    pub logging: CliLoggingArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List repositories you own or reach through an organization
    Repos(repos::ReposArgs),
    /// List your organizations
    Orgs(repos::OrgsArgs),
    /// List the branches of a repository
    Branches(refs::RefListArgs),
    /// List the tags of a repository
    Tags(refs::RefListArgs),
    /// Archive and/or delete branches in one batch
    Archive(archive::ArchiveArgs),
}

/// Resolved settings and credential shared by every command
#[derive(Debug)]
pub struct AppContext {
    pub settings: Settings,
    pub credential: Option<Credential>,
}

impl AppContext {
    pub fn require_credential(&self) -> Result<&Credential> {
        Ok(self
            .credential
            .as_ref()
            .ok_or(CoreError::AuthenticationMissing)?)
    }

    pub fn github_client(&self) -> Result<GitHubClient> {
        Ok(GitHubClient::new(self.settings.github.clone())?)
    }
}

/// First non-blank token among `--token`/`BA_GITHUB_TOKEN` and `GITHUB_TOKEN`
pub fn resolve_credential(flag: Option<&str>, fallback: Option<&str>) -> Option<Credential> {
    Credential::from_optional(flag).or_else(|| Credential::from_optional(fallback))
}

impl Cli {
    /// Load settings with CLI flags applied on top
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            settings.github.api_base_url = url.clone();
        }
        if let Commands::Archive(args) = &self.command {
            args.apply_to(&mut settings.archive);
        }
        Ok(settings)
    }

    pub fn context(&self, settings: Settings) -> AppContext {
        let fallback = std::env::var(settings::TOKEN_ENV_VARS[1]).ok();
        AppContext {
            settings,
            credential: resolve_credential(self.token.as_deref(), fallback.as_deref()),
        }
    }

    /// Run the selected command; `ExitCode::FAILURE` when any branch failed
    pub async fn run(self, ctx: AppContext) -> Result<ExitCode> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let page_size = ctx.settings.archive.page_size;

        match &self.command {
            Commands::Repos(args) => args.run(&ctx, &mut out).await?,
            Commands::Orgs(args) => args.run(&ctx, &mut out).await?,
            Commands::Branches(args) => {
                let credential = ctx.require_credential()?;
                let client = ctx.github_client()?;
                refs::list_branches(&client, credential, args, page_size, &mut out).await?
            }
            Commands::Tags(args) => {
                let credential = ctx.require_credential()?;
                let client = ctx.github_client()?;
                refs::list_tags(&client, credential, args, page_size, &mut out).await?
            }
            Commands::Archive(args) => return run_archive_command(args, &ctx, &mut out).await,
        }
        out.flush()?;
        Ok(ExitCode::SUCCESS)
    }
}

async fn run_archive_command(
    args: &archive::ArchiveArgs,
    ctx: &AppContext,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let client = Arc::new(ctx.github_client()?);
    let orchestrator = LifecycleOrchestrator::new(client)
        .with_max_concurrency(ctx.settings.archive.max_concurrency);
    let mut session =
        ArchiveSession::open(orchestrator, ctx.credential.clone(), args.repo.clone()).await?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    // Unlocked: batch tasks log to stderr from other threads
    let mut err = io::stderr();
    let mut console = archive::Console {
        input: &mut input,
        out,
        err: &mut err,
    };
    let authorized = archive::prepare_batch(
        args,
        &mut session,
        &ctx.settings.archive.tag_prefix,
        &mut console,
    )?;

    // Installed after the prompt so Ctrl-C still aborts while confirming
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; branches not yet started will be skipped");
            on_interrupt.cancel();
        }
    });
    let result = archive::execute_batch(args, &mut session, authorized, &mut console, cancel).await;
    interrupt.abort();

    let report = result?;
    console.out.flush()?;
    Ok(if report.summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_token_wins_over_fallback() {
        let credential = resolve_credential(Some("ghp_flag"), Some("ghp_env")).unwrap();
        assert_eq!(credential.expose(), "ghp_flag");
    }

    #[test]
    fn test_blank_tokens_are_missing() {
        let credential = resolve_credential(Some("  "), Some("ghp_env")).unwrap();
        assert_eq!(credential.expose(), "ghp_env");
        assert!(resolve_credential(Some(""), None).is_none());
        assert!(resolve_credential(None, Some(" ")).is_none());
    }

    #[test]
    fn test_missing_credential_error() {
        let ctx = AppContext {
            settings: Settings::default(),
            credential: None,
        };
        assert_eq!(
            ctx.require_credential().unwrap_err().to_string(),
            "No credential supplied; set a GitHub token before running a batch"
        );
    }
}
