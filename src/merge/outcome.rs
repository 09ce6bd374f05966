//! Per-candidate outcomes and the run report

use crate::types::PullRequestCandidate;

/// Why a candidate was left alone (not an error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Closed, merged, or draft by the time it was processed
    NotOpen,
    /// Gating label missing on the fresh snapshot
    NotLabeled {
        /// Label that was required
        label: String,
    },
    /// Too few approvals, or a reviewer is still requesting changes
    InsufficientApprovals {
        /// Distinct approving reviewers
        approvals: usize,
        /// Configured threshold
        required: usize,
        /// Reviewers whose latest review requests changes
        blocked_by: Vec<String>,
    },
    /// Base could not be merged into head cleanly
    BranchUpdateConflict,
    /// At least one check completed without passing
    ChecksFailed {
        /// Names of failing checks
        failing: Vec<String>,
    },
    /// Checks were still running when the poll timeout expired
    ChecksTimeout {
        /// Names of checks still incomplete
        pending: Vec<String>,
    },
}

impl SkipReason {
    /// Stable identifier for logs and summaries
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotOpen => "not-open",
            Self::NotLabeled { .. } => "not-labeled",
            Self::InsufficientApprovals { .. } => "insufficient-approvals",
            Self::BranchUpdateConflict => "branch-update-conflict",
            Self::ChecksFailed { .. } => "checks-failed",
            Self::ChecksTimeout { .. } => "checks-timeout",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOpen => write!(f, "{}: no longer an open, ready PR", self.code()),
            Self::NotLabeled { label } => write!(f, "{}: missing label '{label}'", self.code()),
            Self::InsufficientApprovals {
                approvals,
                required,
                blocked_by,
            } => {
                write!(f, "{}: {approvals}/{required} approvals", self.code())?;
                if !blocked_by.is_empty() {
                    write!(f, ", changes requested by {}", blocked_by.join(", "))?;
                }
                Ok(())
            }
            Self::BranchUpdateConflict => {
                write!(f, "{}: resolve the conflict manually", self.code())
            }
            Self::ChecksFailed { failing } => {
                write!(f, "{}: {}", self.code(), failing.join(", "))
            }
            Self::ChecksTimeout { pending } => {
                write!(f, "{}: still waiting on {}", self.code(), pending.join(", "))
            }
        }
    }
}

/// Why processing a candidate failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Branch update failed for a reason other than a conflict
    BranchUpdateError(String),
    /// The merge call errored or did not merge
    MergeApiError(String),
    /// A read call (PR, reviews, checks) failed
    ApiError(String),
}

impl FailureReason {
    /// Stable identifier for logs and summaries
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BranchUpdateError(_) => "branch-update-error",
            Self::MergeApiError(_) => "merge-api-error",
            Self::ApiError(_) => "api-error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BranchUpdateError(m) | Self::MergeApiError(m) | Self::ApiError(m) => m,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Terminal result of processing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// PR was merged
    Merged {
        /// Merge commit sha, when the API reported one
        sha: Option<String>,
    },
    /// Every gate passed in a dry run; nothing was written
    WouldMerge,
    /// PR was left alone
    Skipped(SkipReason),
    /// Something went wrong; counts toward the nonzero exit
    Failed(FailureReason),
}

impl ProcessingOutcome {
    /// Whether this outcome makes the run fail
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged { sha: Some(sha) } => write!(f, "merged ({sha})"),
            Self::Merged { sha: None } => write!(f, "merged"),
            Self::WouldMerge => write!(f, "would merge"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// One processed candidate
#[derive(Debug, Clone)]
pub struct CandidateReport {
    /// PR number
    pub number: u64,
    /// PR title (for display)
    pub title: String,
    /// What happened
    pub outcome: ProcessingOutcome,
}

impl CandidateReport {
    pub(crate) fn new(candidate: &PullRequestCandidate, outcome: ProcessingOutcome) -> Self {
        Self {
            number: candidate.number,
            title: candidate.title.clone(),
            outcome,
        }
    }
}

/// Everything a run did, in processing order
///
/// Replaces a global "something failed" flag: the caller derives the exit
/// status from the recorded outcomes.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Outcomes in processing order
    pub candidates: Vec<CandidateReport>,
}

impl RunReport {
    /// Whether any candidate failed (skips do not count)
    pub fn has_failures(&self) -> bool {
        self.candidates.iter().any(|c| c.outcome.is_failure())
    }

    /// PR numbers that were merged
    pub fn merged(&self) -> Vec<u64> {
        self.candidates
            .iter()
            .filter(|c| matches!(c.outcome, ProcessingOutcome::Merged { .. }))
            .map(|c| c.number)
            .collect()
    }

    /// Candidates that were skipped
    pub fn skipped(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates
            .iter()
            .filter(|c| matches!(c.outcome, ProcessingOutcome::Skipped(_)))
    }

    /// Candidates that failed
    pub fn failed(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.outcome.is_failure())
    }

    /// Outcome recorded for a PR, if it was processed
    pub fn outcome_for(&self, number: u64) -> Option<&ProcessingOutcome> {
        self.candidates
            .iter()
            .find(|c| c.number == number)
            .map(|c| &c.outcome)
    }

    /// Process exit code: 0 without failures, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }
}
