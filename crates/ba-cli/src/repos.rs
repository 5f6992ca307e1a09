// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `ba repos` and `ba orgs`

use std::io::Write;

use anyhow::Result;
use ba_domain_types::Repository;
use clap::Args;

use crate::AppContext;
use crate::output::{write_json, write_truncation_notice};

#[derive(Args, Debug, Clone, Default)]
pub struct ReposArgs {
    /// Only repositories whose name contains this text (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only repositories owned by this organization
    #[arg(long, conflicts_with = "personal")]
    pub org: Option<String>,

    /// Only repositories owned by the authenticated user
    #[arg(long)]
    pub personal: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OrgsArgs {
    /// Print JSON instead of a list
    #[arg(long)]
    pub json: bool,
}

/// Which owners a repository listing keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter<'a> {
    Any,
    /// Repositories owned by this user login
    User(&'a str),
    /// Repositories owned by this organization login
    Org(&'a str),
}

/// Apply the owner filter, then the name search, keeping listing order
pub fn filter_repositories<'a>(
    repositories: &'a [Repository],
    owner: OwnerFilter<'_>,
    search: Option<&str>,
) -> Vec<&'a Repository> {
    let search = search.map(str::trim).filter(|term| !term.is_empty());
    repositories
        .iter()
        .filter(|repo| match owner {
            OwnerFilter::Any => true,
            OwnerFilter::User(login) => repo
                .owner
                .as_ref()
                .is_some_and(|o| o.is_user() && o.login.eq_ignore_ascii_case(login)),
            OwnerFilter::Org(org) => repo
                .owner_login()
                .is_some_and(|login| login.eq_ignore_ascii_case(org)),
        })
        .filter(|repo| search.map_or(true, |term| repo.matches_search(term)))
        .collect()
}

impl ReposArgs {
    pub async fn run(&self, ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
        let credential = ctx.require_credential()?;
        let client = ctx.github_client()?;

        let user = client.authenticated_user(credential).await?;
        tracing::info!(login = %user.login, "Authenticated");

        let listing = client.list_repositories(credential).await?;
        let owner = if self.personal {
            OwnerFilter::User(&user.login)
        } else if let Some(org) = &self.org {
            OwnerFilter::Org(org)
        } else {
            OwnerFilter::Any
        };
        let repositories = filter_repositories(&listing.items, owner, self.search.as_deref());

        if self.json {
            return write_json(out, &repositories);
        }
        if listing.truncated {
            write_truncation_notice(out, "repository")?;
        }
        if repositories.is_empty() {
            writeln!(out, "No repositories found")?;
            return Ok(());
        }
        for repo in repositories {
            writeln!(out, "{:<50} {}", repo.full_name, repo.default_branch)?;
        }
        Ok(())
    }
}

impl OrgsArgs {
    pub async fn run(&self, ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
        let credential = ctx.require_credential()?;
        let listing = ctx.github_client()?.list_organizations(credential).await?;

        if self.json {
            return write_json(out, &listing.items);
        }
        if listing.truncated {
            write_truncation_notice(out, "organization")?;
        }
        if listing.is_empty() {
            writeln!(out, "No organizations found")?;
        }
        for org in &listing.items {
            writeln!(out, "{}", org.login)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ba_domain_types::RepositoryOwner;

    fn repo(name: &str, owner: &str, kind: &str) -> Repository {
        Repository {
            id: 1,
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            clone_url: format!("https://github.com/{}/{}.git", owner, name),
            default_branch: "main".to_string(),
            owner: Some(RepositoryOwner {
                login: owner.to_string(),
                kind: kind.to_string(),
            }),
        }
    }

    fn names(repos: Vec<&Repository>) -> Vec<&str> {
        repos.into_iter().map(|r| r.full_name.as_str()).collect()
    }

    fn fixture() -> Vec<Repository> {
        vec![
            repo("dotfiles", "alice", "User"),
            repo("Widgets", "acme", "Organization"),
            repo("widget-docs", "alice", "User"),
            repo("infra", "acme", "Organization"),
        ]
    }

    #[test]
    fn test_no_filters_keeps_everything_in_order() {
        let repos = fixture();
        assert_eq!(
            names(filter_repositories(&repos, OwnerFilter::Any, None)),
            ["alice/dotfiles", "acme/Widgets", "alice/widget-docs", "acme/infra"]
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let repos = fixture();
        assert_eq!(
            names(filter_repositories(&repos, OwnerFilter::Any, Some("WIDGET"))),
            ["acme/Widgets", "alice/widget-docs"]
        );
        assert_eq!(
            filter_repositories(&repos, OwnerFilter::Any, Some("  ")).len(),
            4
        );
    }

    #[test]
    fn test_owner_filters() {
        let repos = fixture();
        assert_eq!(
            names(filter_repositories(&repos, OwnerFilter::User("Alice"), None)),
            ["alice/dotfiles", "alice/widget-docs"]
        );
        assert_eq!(
            names(filter_repositories(&repos, OwnerFilter::Org("acme"), Some("wid"))),
            ["acme/Widgets"]
        );
        assert!(filter_repositories(&repos, OwnerFilter::User("acme"), None).is_empty());
    }
}
