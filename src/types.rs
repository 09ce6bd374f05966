//! Core types for pr-automerge

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Repository the orchestrator works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// `owner/repo` form used in logs and the summary
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open and can be merged
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// An open pull request under consideration for merging
///
/// Always a fresh snapshot from the platform; the run controller re-fetches
/// it before gating and again after the head branch was updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestCandidate {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Label names currently on the PR
    pub labels: BTreeSet<String>,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Commit sha at the tip of the head branch
    pub head_sha: String,
    /// Current state of the PR
    pub state: PrState,
    /// Whether PR is a draft
    pub is_draft: bool,
    /// When the PR was opened (FIFO ordering key)
    pub created_at: DateTime<Utc>,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequestCandidate {
    /// Whether the PR carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// State of a submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Reviewer approved the changes
    Approved,
    /// Reviewer requested changes (blocks merging)
    ChangesRequested,
    /// Comment-only review
    Commented,
    /// An earlier review was dismissed
    Dismissed,
    /// Review started but not submitted
    Pending,
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::ChangesRequested => write!(f, "changes requested"),
            Self::Commented => write!(f, "commented"),
            Self::Dismissed => write!(f, "dismissed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// A single review on a PR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Login of the reviewer
    pub reviewer: String,
    /// Review state
    pub state: ReviewState,
    /// Submission time (None while pending)
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Execution status of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Waiting to start
    Queued,
    /// Running
    InProgress,
    /// Finished, see conclusion
    Completed,
    /// Waiting on something else (deployment protection, concurrency group)
    Waiting,
    /// Requested but not yet queued
    Requested,
    /// Any status the API added after this was written
    #[serde(other)]
    Pending,
}

/// Final conclusion of a completed check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// Passed
    Success,
    /// Failed
    Failure,
    /// Neither passed nor failed
    Neutral,
    /// Skipped by its workflow
    Skipped,
    /// Cancelled
    Cancelled,
    /// Ran out of time
    TimedOut,
    /// Needs a human
    ActionRequired,
    /// Superseded
    Stale,
    /// Any conclusion the API added after this was written
    #[serde(other)]
    Unknown,
}

impl CheckConclusion {
    /// Only `success` lets a PR merge; `neutral` and `skipped` do not
    pub const fn is_passing(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for CheckConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Stale => "stale",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A CI check run attached to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check name as shown on the PR
    pub name: String,
    /// Execution status
    pub status: CheckStatus,
    /// Conclusion, present once completed
    pub conclusion: Option<CheckConclusion>,
    /// Commit the check ran against
    pub head_sha: String,
}

impl CheckRun {
    /// Whether the run has finished
    pub fn is_completed(&self) -> bool {
        self.status == CheckStatus::Completed
    }

    /// Whether the run finished successfully
    ///
    /// A completed run without a conclusion counts as failing.
    pub fn is_passing(&self) -> bool {
        self.is_completed() && self.conclusion.is_some_and(CheckConclusion::is_passing)
    }
}

/// Outcome of asking the platform to update a PR branch from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchUpdate {
    /// Base was merged into head; the head sha will change
    Updated,
    /// Head already contains the base
    AlreadyUpToDate,
    /// Base cannot be merged cleanly; needs manual resolution
    Conflict,
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl FromStr for MergeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "squash" => Ok(Self::Squash),
            "rebase" => Ok(Self::Rebase),
            other => Err(Error::Config(format!(
                "unknown merge method '{other}' (expected merge, squash or rebase)"
            ))),
        }
    }
}
