// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Lazy page-by-page traversal of GitHub list endpoints
//!
//! GitHub signals further pages through the `Link` response header. Listings
//! stop when no `rel="next"` link is advertised or when the configured page
//! ceiling is reached; in the latter case the listing is marked truncated
//! instead of silently dropping the remainder.

use std::marker::PhantomData;

use ba_domain_types::{Credential, Listing};
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::GitHubClient;
use crate::error::GitHubClientResult;

/// Whether a `Link` header advertises a next page
pub fn has_next_page(link_header: Option<&str>) -> bool {
    let Some(link_header) = link_header else {
        return false;
    };
    link_header.split(',').any(|link| {
        link.split(';')
            .skip(1)
            .any(|param| matches!(param.trim(), r#"rel="next""# | "rel=next"))
    })
}

/// Page bookkeeping, independent of transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    next_page: u32,
    max_pages: u32,
    exhausted: bool,
    truncated: bool,
}

impl PageCursor {
    pub fn new(max_pages: u32) -> Self {
        Self {
            next_page: 1,
            max_pages: max_pages.max(1),
            exhausted: false,
            truncated: false,
        }
    }

    /// Number of the page to fetch next, or `None` once the listing is over
    pub fn next_page_number(&mut self) -> Option<u32> {
        if self.exhausted {
            return None;
        }
        if self.next_page > self.max_pages {
            // The last fetched page still advertised a successor.
            self.exhausted = true;
            self.truncated = true;
            return None;
        }
        Some(self.next_page)
    }

    /// Record the outcome of fetching the page returned by `next_page_number`
    pub fn record(&mut self, has_next: bool) {
        self.next_page += 1;
        if !has_next {
            self.exhausted = true;
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Restartable lazy listing; each call to a `list_*` method starts a fresh one.
pub struct Paginator<'a, T> {
    client: &'a GitHubClient,
    credential: &'a Credential,
    url: Url,
    cursor: PageCursor,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    pub(crate) fn new(client: &'a GitHubClient, credential: &'a Credential, url: Url) -> Self {
        let cursor = PageCursor::new(client.config().max_pages);
        Self {
            client,
            credential,
            url,
            cursor,
            _item: PhantomData,
        }
    }

    /// Fetch the next page, or `None` when the listing has ended
    pub async fn next_page(&mut self) -> GitHubClientResult<Option<Vec<T>>> {
        let Some(page) = self.cursor.next_page_number() else {
            return Ok(None);
        };

        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("per_page", &self.client.config().per_page.to_string())
            .append_pair("page", &page.to_string());

        let (items, has_next) = self.client.fetch_page::<T>(self.credential, url).await?;
        self.cursor.record(has_next);
        Ok(Some(items))
    }

    /// Whether the page ceiling cut the listing short
    pub fn truncated(&self) -> bool {
        self.cursor.truncated()
    }

    /// Drain every remaining page into a [`Listing`]
    pub async fn collect_all(mut self) -> GitHubClientResult<Listing<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }

        let truncated = self.truncated();
        if truncated {
            tracing::warn!(
                url = %self.url,
                items = items.len(),
                max_pages = self.client.config().max_pages,
                "Listing truncated at page ceiling; more items exist upstream"
            );
        }
        Ok(Listing { items, truncated })
    }
}
