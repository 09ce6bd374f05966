//! Approval gate - pure reduction of a PR's review history
//!
//! GitHub lists reviews in pages without any per-reviewer aggregation. The
//! gate only cares about each reviewer's latest submitted state, so the
//! history is reduced to one state per reviewer before counting.

use crate::types::{Review, ReviewState};
use std::collections::BTreeMap;

/// Current review state per reviewer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalSummary {
    latest: BTreeMap<String, ReviewState>,
}

impl ApprovalSummary {
    /// Reviewers whose latest review approves, sorted by login
    pub fn approvers(&self) -> Vec<&str> {
        self.with_state(ReviewState::Approved)
    }

    /// Reviewers whose latest review requests changes, sorted by login
    pub fn blockers(&self) -> Vec<&str> {
        self.with_state(ReviewState::ChangesRequested)
    }

    /// Number of distinct approving reviewers
    pub fn approval_count(&self) -> usize {
        self.approvers().len()
    }

    /// Whether any reviewer is still requesting changes
    pub fn has_blocking_review(&self) -> bool {
        !self.blockers().is_empty()
    }

    /// Latest state for one reviewer
    pub fn state_of(&self, reviewer: &str) -> Option<ReviewState> {
        self.latest.get(reviewer).copied()
    }

    fn with_state(&self, state: ReviewState) -> Vec<&str> {
        self.latest
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(login, _)| login.as_str())
            .collect()
    }
}

/// Reduce a review history to the latest state per reviewer
///
/// Pending (unsubmitted) reviews are ignored. The remaining reviews are
/// ordered by submission time; ties keep the API order. A later review of
/// any kind replaces the reviewer's earlier state.
pub fn summarize_reviews(reviews: &[Review]) -> ApprovalSummary {
    let mut submitted: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.state != ReviewState::Pending && r.submitted_at.is_some())
        .collect();
    submitted.sort_by_key(|r| r.submitted_at);

    let mut latest = BTreeMap::new();
    for review in submitted {
        latest.insert(review.reviewer.clone(), review.state);
    }
    ApprovalSummary { latest }
}

/// Whether the summary satisfies the approval policy
///
/// True iff at least `required` distinct reviewers currently approve and
/// nobody currently requests changes. `required == 0` turns off the count
/// but not the change-request block.
pub fn approval_gate(summary: &ApprovalSummary, required: usize) -> bool {
    summary.approval_count() >= required && !summary.has_blocking_review()
}
