// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shared console output helpers

use std::io::Write;
use std::ops::Range;

use anyhow::{Result, bail};
use serde::Serialize;

/// One-based page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    #[serde(skip)]
    page_size: usize,
}

impl PageWindow {
    /// An empty listing still has one (empty) page
    pub fn new(total: usize, page: usize, page_size: usize) -> Result<Self> {
        let page_size = page_size.max(1);
        let pages = total.div_ceil(page_size).max(1);
        if page == 0 || page > pages {
            bail!("Page {} is out of range (1-{})", page, pages);
        }
        Ok(Self {
            page,
            pages,
            total,
            page_size,
        })
    }

    /// Zero-based page index
    pub fn index(&self) -> usize {
        self.page - 1
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn range(&self) -> Range<usize> {
        let start = (self.index() * self.page_size).min(self.total);
        start..(start + self.page_size).min(self.total)
    }
}

/// JSON envelope for a paged listing
#[derive(Debug, Serialize)]
pub struct PageView<'a, T: Serialize> {
    #[serde(flatten)]
    pub window: PageWindow,
    pub truncated: bool,
    pub items: &'a [T],
}

pub fn write_json<W: Write + ?Sized, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Warn that a listing stopped at the page ceiling
pub fn write_truncation_notice<W: Write + ?Sized>(out: &mut W, what: &str) -> Result<()> {
    writeln!(
        out,
        "warning: the {} list was truncated at the page limit; some entries are not shown",
        what
    )?;
    Ok(())
}
