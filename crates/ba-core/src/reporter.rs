// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Human-readable batch summaries and working-set pruning

use ba_domain_types::{BatchResult, BranchOutcome};
use serde::Serialize;

use crate::working_set::WorkingSet;

/// Per-branch messages split by outcome, each list in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub success_messages: Vec<String>,
    pub failure_messages: Vec<String>,
}

impl Summary {
    pub fn all_succeeded(&self) -> bool {
        self.failure_messages.is_empty()
    }
}

/// Describe one outcome without claiming an action that did not happen
pub fn describe(outcome: &BranchOutcome) -> String {
    if outcome.success {
        let action = match (outcome.archived, outcome.deleted) {
            (true, true) => "archived and deleted",
            (true, false) => "archived",
            (false, _) => "deleted",
        };
        format!("{} ({})", outcome.branch, action)
    } else {
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        if outcome.archived {
            format!("{} (archived; {})", outcome.branch, error)
        } else {
            format!("{} ({})", outcome.branch, error)
        }
    }
}

pub fn summarize(batch: &BatchResult) -> Summary {
    let (successes, failures) = batch.partition();
    Summary {
        success_messages: successes.into_iter().map(describe).collect(),
        failure_messages: failures.into_iter().map(describe).collect(),
    }
}

/// Remove every branch the batch deleted and clear all selections
pub fn prune(mut working_set: WorkingSet, batch: &BatchResult) -> WorkingSet {
    working_set.remove(batch.deleted_branches());
    working_set.unselect_all();
    working_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use ba_domain_types::{Branch, OperationMode};

    #[test]
    fn test_messages_describe_what_happened() {
        let batch = BatchResult::new(vec![
            BranchOutcome::succeeded("a", OperationMode::ArchiveAndDelete),
            BranchOutcome::succeeded("b", OperationMode::ArchiveOnly),
            BranchOutcome::failed("c", true, "delete failed: 422"),
            BranchOutcome::succeeded("d", OperationMode::DeleteOnly),
            BranchOutcome::failed("e", false, "tag creation failed: 403"),
        ]);
        let summary = summarize(&batch);
        assert_eq!(
            summary.success_messages,
            ["a (archived and deleted)", "b (archived)", "d (deleted)"]
        );
        assert_eq!(
            summary.failure_messages,
            ["c (archived; delete failed: 422)", "e (tag creation failed: 403)"]
        );
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_every_mode_names_its_action() {
        let describe_mode = |mode| describe(&BranchOutcome::succeeded("x", mode));
        assert_eq!(describe_mode(OperationMode::ArchiveOnly), "x (archived)");
        assert_eq!(
            describe_mode(OperationMode::ArchiveAndDelete),
            "x (archived and deleted)"
        );
        assert_eq!(describe_mode(OperationMode::DeleteOnly), "x (deleted)");
    }

    #[test]
    fn test_prune_removes_exactly_the_deleted_branches() {
        let mut set = WorkingSet::new(vec![
            Branch::new("a", "1"),
            Branch::new("b", "2"),
            Branch::new("c", "3"),
            Branch::new("d", "4"),
        ]);
        set.select("a").unwrap();
        set.select("b").unwrap();
        set.select("c").unwrap();

        let batch = BatchResult::new(vec![
            BranchOutcome::succeeded("a", OperationMode::ArchiveAndDelete),
            BranchOutcome::succeeded("b", OperationMode::ArchiveOnly),
            BranchOutcome::succeeded("c", OperationMode::DeleteOnly),
        ]);
        let set = prune(set, &batch);

        let remaining: Vec<_> = set.branches().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(remaining, ["b", "d"]);
        assert_eq!(set.selected_count(), 0);
    }

    #[test]
    fn test_failed_branches_stay_in_the_working_set() {
        let set = WorkingSet::new(vec![Branch::new("a", "1"), Branch::new("b", "2")]);
        let batch = BatchResult::new(vec![
            BranchOutcome::failed("a", true, "delete failed"),
            BranchOutcome::succeeded("b", OperationMode::DeleteOnly),
        ]);
        let set = prune(set, &batch);
        assert_eq!(set.len(), 1);
        assert_eq!(set.branches()[0].name, "a");
    }
}
