// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The operator's local view of a repository's branches
//!
//! Selection is kept as a set of branch names next to the authoritative branch
//! list instead of a flag on each branch, so refreshing or pruning the list
//! never leaves a stale selection behind.

use std::collections::HashSet;

use ba_domain_types::Branch;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Unknown branch '{0}'")]
    UnknownBranch(String),

    #[error("Branch '{0}' is protected and cannot be selected")]
    ProtectedBranch(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    branches: Vec<Branch>,
    selected: HashSet<String>,
}

impl WorkingSet {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self {
            branches,
            selected: HashSet::new(),
        }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn select(&mut self, name: &str) -> Result<(), SelectionError> {
        let branch = self
            .get(name)
            .ok_or_else(|| SelectionError::UnknownBranch(name.to_string()))?;
        if branch.protected {
            return Err(SelectionError::ProtectedBranch(name.to_string()));
        }
        self.selected.insert(name.to_string());
        Ok(())
    }

    /// Returns whether the branch was selected
    pub fn unselect(&mut self, name: &str) -> bool {
        self.selected.remove(name)
    }

    /// Flip the selection of `name`; returns the new state
    pub fn toggle(&mut self, name: &str) -> Result<bool, SelectionError> {
        if self.unselect(name) {
            Ok(false)
        } else {
            self.select(name).map(|()| true)
        }
    }

    /// Select every unprotected branch; returns how many are selected
    pub fn select_all(&mut self) -> usize {
        self.selected = self
            .branches
            .iter()
            .filter(|b| !b.protected)
            .map(|b| b.name.clone())
            .collect();
        self.selected.len()
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected branch names in branch-list order
    pub fn selected_names(&self) -> Vec<String> {
        self.branches
            .iter()
            .filter(|b| self.selected.contains(&b.name))
            .map(|b| b.name.clone())
            .collect()
    }

    /// Drop the named branches from the list and their selections
    pub fn remove<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let names: HashSet<&str> = names.into_iter().collect();
        self.branches.retain(|b| !names.contains(b.name.as_str()));
        self.selected.retain(|name| !names.contains(name.as_str()));
    }

    /// Zero-based page of `page_size` branches; empty past the end
    pub fn page(&self, page: usize, page_size: usize) -> &[Branch] {
        let page_size = page_size.max(1);
        let start = page.saturating_mul(page_size).min(self.branches.len());
        let end = start.saturating_add(page_size).min(self.branches.len());
        &self.branches[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        self.branches.len().div_ceil(page_size.max(1))
    }
}
