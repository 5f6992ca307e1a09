// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `ba branches` and `ba tags`

use std::io::Write;

use anyhow::{Context, Result};
use ba_core::{RemoteRepositoryClient, WorkingSet};
use ba_domain_types::{Credential, RepoRef};
use clap::Args;

use crate::output::{PageView, PageWindow, write_json, write_truncation_notice};

#[derive(Args, Debug, Clone)]
pub struct RefListArgs {
    /// Repository as OWNER/NAME
    pub repo: RepoRef,

    /// Page to show, starting at 1
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn list_branches<C>(
    client: &C,
    credential: &Credential,
    args: &RefListArgs,
    page_size: usize,
    out: &mut dyn Write,
) -> Result<()>
where
    C: RemoteRepositoryClient + ?Sized,
{
    let listing = client
        .list_branches(credential, &args.repo)
        .await
        .map_err(|e| ba_core::Error::ListingFailed {
            repo: args.repo.to_string(),
            message: e.to_string(),
        })?;
    let truncated = listing.truncated;
    let branches = WorkingSet::new(listing.items);
    let window = PageWindow::new(branches.len(), args.page, page_size)?;
    let rows = branches.page(window.index(), window.page_size());

    if args.json {
        return write_json(
            out,
            &PageView {
                window,
                truncated,
                items: rows,
            },
        );
    }

    if truncated {
        write_truncation_notice(out, "branch")?;
    }
    writeln!(
        out,
        "Branches of {} (page {}/{}, {} total)",
        args.repo, window.page, window.pages, window.total
    )?;
    for branch in rows {
        let marker = if branch.protected { "  [protected]" } else { "" };
        writeln!(out, "  {:<7}  {}{}", branch.commit.short_sha(), branch.name, marker)?;
    }
    Ok(())
}

pub async fn list_tags<C>(
    client: &C,
    credential: &Credential,
    args: &RefListArgs,
    page_size: usize,
    out: &mut dyn Write,
) -> Result<()>
where
    C: RemoteRepositoryClient + ?Sized,
{
    let listing = client
        .list_tags(credential, &args.repo)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Failed to list tags of {}", args.repo))?;
    let window = PageWindow::new(listing.len(), args.page, page_size)?;
    let rows = &listing.items[window.range()];

    if args.json {
        return write_json(
            out,
            &PageView {
                window,
                truncated: listing.truncated,
                items: rows,
            },
        );
    }

    if listing.truncated {
        write_truncation_notice(out, "tag")?;
    }
    writeln!(
        out,
        "Tags of {} (page {}/{}, {} total)",
        args.repo, window.page, window.pages, window.total
    )?;
    for tag in rows {
        writeln!(out, "  {:<7}  {}", tag.commit.short_sha(), tag.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ba_core::testing::MockRemoteClient;
    use ba_domain_types::Branch;

    fn args(page: usize, json: bool) -> RefListArgs {
        RefListArgs {
            repo: RepoRef::new("octo", "widgets"),
            page,
            json,
        }
    }

    fn client() -> MockRemoteClient {
        MockRemoteClient::new()
            .with_branch(Branch::new("main", "0123456789abcdef").protected())
            .with_branches(["feature/a", "feature/b", "old"])
            .with_tag("archive/legacy")
    }

    async fn render_branches(page: usize, json: bool) -> Result<String> {
        let mut out = Vec::new();
        list_branches(&client(), &Credential::new("ghp_test"), &args(page, json), 2, &mut out)
            .await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_branch_table_marks_protected_branches() {
        let text = render_branches(1, false).await.unwrap();
        assert_eq!(
            text,
            "Branches of octo/widgets (page 1/2, 4 total)\n  0123456  main  [protected]\n  sha-fea  feature/a\n"
        );
    }

    #[tokio::test]
    async fn test_branch_json_page() {
        let text = render_branches(2, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["page"], 2);
        assert_eq!(value["total"], 4);
        assert_eq!(value["truncated"], false);
        assert_eq!(value["items"][0]["name"], "feature/b");
        assert_eq!(value["items"][1]["name"], "old");
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let err = render_branches(3, false).await.unwrap_err();
        assert_eq!(err.to_string(), "Page 3 is out of range (1-2)");
    }

    #[tokio::test]
    async fn test_tag_listing() {
        let mut out = Vec::new();
        list_tags(&client(), &Credential::new("ghp_test"), &args(1, false), 10, &mut out)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Tags of octo/widgets (page 1/1, 1 total)\n  sha-arc  archive/legacy\n"
        );
    }
}
