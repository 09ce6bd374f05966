//! Platform service for the code-hosting API
//!
//! The orchestrator only talks to the host through [`PlatformService`], so
//! the run controller can be driven by a mock in tests.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    BranchUpdate, CheckRun, MergeMethod, MergeResult, PlatformConfig, PullRequestCandidate, Review,
};
use async_trait::async_trait;

/// Platform service trait for the remote calls the merge queue needs
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// List every open PR of the repository (all pages)
    async fn list_open_prs(&self) -> Result<Vec<PullRequestCandidate>>;

    /// Fetch a single PR with fresh labels, state and head sha
    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestCandidate>;

    /// List all submitted and pending reviews on a PR
    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>>;

    /// List all check runs reported for a commit
    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>>;

    /// Merge the base branch into the PR's head branch
    ///
    /// `expected_head_sha` guards against updating a branch that moved since
    /// it was last fetched. A merge conflict is reported as
    /// [`BranchUpdate::Conflict`], not as an error.
    async fn update_branch(&self, pr_number: u64, expected_head_sha: &str) -> Result<BranchUpdate>;

    /// Merge a PR with the specified method and commit title
    ///
    /// The host refuses the merge if the head is no longer `head_sha`, so a
    /// commit whose checks were never read cannot be merged.
    async fn merge_pr(
        &self,
        pr_number: u64,
        method: MergeMethod,
        commit_title: &str,
        head_sha: &str,
    ) -> Result<MergeResult>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
