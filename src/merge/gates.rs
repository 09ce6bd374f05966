//! Cheap gates evaluated on a fresh PR snapshot

use crate::types::{PrState, PullRequestCandidate};
use std::collections::BTreeSet;

/// Whether the label set satisfies the gating label
///
/// No required label means every PR passes.
pub fn label_gate(labels: &BTreeSet<String>, required: Option<&str>) -> bool {
    required.is_none_or(|label| labels.contains(label))
}

/// Whether the PR can still be merged at all
pub fn is_open_and_ready(candidate: &PullRequestCandidate) -> bool {
    candidate.state == PrState::Open && !candidate.is_draft
}
