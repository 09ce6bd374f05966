//! Progress reporting hooks for the run controller

use crate::merge::outcome::CandidateReport;
use crate::types::PullRequestCandidate;
use async_trait::async_trait;

/// Receives human-facing progress while the queue runs
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Free-form status line
    async fn on_message(&self, message: &str);

    /// A candidate is about to be processed
    async fn on_candidate_start(&self, candidate: &PullRequestCandidate) {
        self.on_message(&format!("PR #{}: {}", candidate.number, candidate.title))
            .await;
    }

    /// A candidate reached its terminal outcome
    async fn on_outcome(&self, report: &CandidateReport) {
        self.on_message(&format!("PR #{} {}", report.number, report.outcome))
            .await;
    }
}

/// Progress sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
