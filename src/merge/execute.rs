//! Run controller - effectful operations
//!
//! Drives discovery and then every candidate through the gates in a fixed
//! order: fresh snapshot, label, approvals, branch update, checks, merge.
//! Cheap and staleness-sensitive gates come first. Each candidate ends in
//! exactly one outcome before the next one starts.

use crate::error::{Error, Result};
use crate::merge::discover::discover_candidates;
use crate::merge::gates::{is_open_and_ready, label_gate};
use crate::merge::outcome::{
    CandidateReport, FailureReason, ProcessingOutcome, RunReport, SkipReason,
};
use crate::merge::poll::{
    CheckVerdict, Clock, PollOutcome, PollPolicy, evaluate_checks, wait_for_checks,
    wait_for_head_change,
};
use crate::merge::progress::ProgressCallback;
use crate::merge::review::{approval_gate, summarize_reviews};
use crate::platform::PlatformService;
use crate::types::{BranchUpdate, MergeMethod, PullRequestCandidate};
use tracing::{debug, info, warn};

/// Default number of distinct approvals required
pub const DEFAULT_REQUIRED_APPROVALS: usize = 2;

/// Policy for one run of the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Gating label; `None` considers every open PR
    pub label: Option<String>,
    /// Distinct approvals required (0 disables the count)
    pub required_approvals: usize,
    /// Check polling policy
    pub poll: PollPolicy,
    /// Merge strategy
    pub merge_method: MergeMethod,
    /// Evaluate gates only; never update branches or merge
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            label: None,
            required_approvals: DEFAULT_REQUIRED_APPROVALS,
            poll: PollPolicy::default(),
            merge_method: MergeMethod::default(),
            dry_run: false,
        }
    }
}

/// Commit title used for the merge
pub fn merge_commit_title(candidate: &PullRequestCandidate) -> String {
    format!("{} (#{})", candidate.title, candidate.number)
}

fn api_failure(e: &Error) -> ProcessingOutcome {
    ProcessingOutcome::Failed(FailureReason::ApiError(e.to_string()))
}

/// Process the whole queue (EFFECTFUL)
///
/// Only discovery errors are returned as `Err`; anything that goes wrong
/// for a single candidate is recorded in the report and the run moves on.
pub async fn run_merge_queue(
    platform: &dyn PlatformService,
    clock: &dyn Clock,
    options: &RunOptions,
    progress: &dyn ProgressCallback,
) -> Result<RunReport> {
    let candidates = discover_candidates(platform, options.label.as_deref()).await?;
    info!(
        repo = %platform.config().full_name(),
        count = candidates.len(),
        dry_run = options.dry_run,
        "starting merge queue"
    );
    progress
        .on_message(&format!("Found {} candidate PR(s)", candidates.len()))
        .await;

    let mut report = RunReport::default();
    for candidate in &candidates {
        progress.on_candidate_start(candidate).await;

        let outcome = process_candidate(platform, clock, candidate.number, options, progress).await;
        if outcome.is_failure() {
            warn!(pr_number = candidate.number, %outcome, "candidate failed");
        } else {
            info!(pr_number = candidate.number, %outcome, "candidate done");
        }

        let entry = CandidateReport::new(candidate, outcome);
        progress.on_outcome(&entry).await;
        report.candidates.push(entry);
    }

    Ok(report)
}

/// Take one PR through every gate and merge it if they all pass
pub async fn process_candidate(
    platform: &dyn PlatformService,
    clock: &dyn Clock,
    pr_number: u64,
    options: &RunOptions,
    progress: &dyn ProgressCallback,
) -> ProcessingOutcome {
    // Labels and state may have changed since discovery
    let pr = match platform.get_pr(pr_number).await {
        Ok(pr) => pr,
        Err(e) => return api_failure(&e),
    };

    if !is_open_and_ready(&pr) {
        return ProcessingOutcome::Skipped(SkipReason::NotOpen);
    }

    if !label_gate(&pr.labels, options.label.as_deref()) {
        return ProcessingOutcome::Skipped(SkipReason::NotLabeled {
            label: options.label.clone().unwrap_or_default(),
        });
    }

    let reviews = match platform.list_reviews(pr_number).await {
        Ok(reviews) => reviews,
        Err(e) => return api_failure(&e),
    };
    let summary = summarize_reviews(&reviews);
    debug!(
        pr_number,
        approvers = ?summary.approvers(),
        blockers = ?summary.blockers(),
        "reviews summarized"
    );
    if !approval_gate(&summary, options.required_approvals) {
        return ProcessingOutcome::Skipped(SkipReason::InsufficientApprovals {
            approvals: summary.approval_count(),
            required: options.required_approvals,
            blocked_by: summary.blockers().into_iter().map(String::from).collect(),
        });
    }

    if options.dry_run {
        return dry_run_checks(platform, &pr, &options.poll).await;
    }

    let head_sha = match platform.update_branch(pr_number, &pr.head_sha).await {
        Ok(BranchUpdate::Conflict) => {
            return ProcessingOutcome::Skipped(SkipReason::BranchUpdateConflict);
        }
        Ok(BranchUpdate::AlreadyUpToDate) => pr.head_sha.clone(),
        Ok(BranchUpdate::Updated) => {
            progress
                .on_message(&format!("Updated {} from {}", pr.head_ref, pr.base_ref))
                .await;
            // The update lands asynchronously; checks must be read for the new sha
            match wait_for_head_change(platform, clock, pr_number, &pr.head_sha, &options.poll)
                .await
            {
                Ok(Some(sha)) => sha,
                Ok(None) => {
                    return ProcessingOutcome::Skipped(SkipReason::ChecksTimeout {
                        pending: vec![format!("branch update of {}", pr.head_ref)],
                    });
                }
                Err(e) => return api_failure(&e),
            }
        }
        Err(e) => {
            return ProcessingOutcome::Failed(FailureReason::BranchUpdateError(e.to_string()));
        }
    };

    progress
        .on_message(&format!("Waiting for checks on {}", short_sha(&head_sha)))
        .await;
    match wait_for_checks(platform, clock, &head_sha, &options.poll).await {
        Ok(PollOutcome::Succeeded) => {}
        Ok(PollOutcome::Failed { failing }) => {
            return ProcessingOutcome::Skipped(SkipReason::ChecksFailed { failing });
        }
        Ok(PollOutcome::TimedOut { pending }) => {
            return ProcessingOutcome::Skipped(SkipReason::ChecksTimeout { pending });
        }
        Err(e) => return api_failure(&e),
    }

    let title = merge_commit_title(&pr);
    match platform
        .merge_pr(pr_number, options.merge_method, &title, &head_sha)
        .await
    {
        Ok(result) if result.merged => ProcessingOutcome::Merged { sha: result.sha },
        Ok(result) => ProcessingOutcome::Failed(FailureReason::MergeApiError(
            result
                .message
                .unwrap_or_else(|| "merge was not performed".to_string()),
        )),
        Err(e) => ProcessingOutcome::Failed(FailureReason::MergeApiError(e.to_string())),
    }
}

/// Read checks once without waiting; nothing is written
async fn dry_run_checks(
    platform: &dyn PlatformService,
    pr: &PullRequestCandidate,
    policy: &PollPolicy,
) -> ProcessingOutcome {
    let runs = match platform.list_check_runs(&pr.head_sha).await {
        Ok(runs) => runs,
        Err(e) => return api_failure(&e),
    };

    match evaluate_checks(&runs, &policy.excluded_checks) {
        CheckVerdict::Failed { failing } => {
            ProcessingOutcome::Skipped(SkipReason::ChecksFailed { failing })
        }
        CheckVerdict::Pending { pending } => {
            debug!(pr_number = pr.number, ?pending, "dry run: checks still running");
            ProcessingOutcome::WouldMerge
        }
        CheckVerdict::Succeeded => ProcessingOutcome::WouldMerge,
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
