//! Candidate discovery

use crate::error::Result;
use crate::merge::gates::label_gate;
use crate::platform::PlatformService;
use crate::types::PullRequestCandidate;
use tracing::debug;

/// Order candidates oldest first (FIFO), PR number breaking ties
///
/// Duplicate PR numbers are collapsed so no PR is processed twice.
pub fn order_fifo(candidates: &mut Vec<PullRequestCandidate>) {
    candidates.sort_by_key(|c| (c.created_at, c.number));
    candidates.dedup_by_key(|c| c.number);
}

/// List open PRs that carry `label` (all open PRs when `None`), oldest first
///
/// Read-only. The label filter here only narrows the queue; the run
/// controller checks the label again on a fresh snapshot.
pub async fn discover_candidates(
    platform: &dyn PlatformService,
    label: Option<&str>,
) -> Result<Vec<PullRequestCandidate>> {
    let open = platform.list_open_prs().await?;
    let total = open.len();

    let mut candidates: Vec<PullRequestCandidate> = open
        .into_iter()
        .filter(|pr| label_gate(&pr.labels, label))
        .collect();
    order_fifo(&mut candidates);

    debug!(
        total,
        candidates = candidates.len(),
        label = label.unwrap_or("<none>"),
        "discovered candidates"
    );
    Ok(candidates)
}
