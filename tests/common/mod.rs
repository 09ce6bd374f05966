//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{MergePrCall, MockPlatformService, UpdateBranchCall, synced_sha};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use pr_automerge::merge::{CandidateReport, Clock, ProgressCallback};
use pr_automerge::types::{
    CheckConclusion, CheckRun, CheckStatus, PlatformConfig, PrState, PullRequestCandidate, Review,
    ReviewState,
};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Config for the test repository
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        host: None,
    }
}

/// Fixed reference time all test timestamps are relative to
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

/// Open PR created `created_offset_mins` after [`base_time`]
pub fn make_pr(number: u64, labels: &[&str], created_offset_mins: i64) -> PullRequestCandidate {
    PullRequestCandidate {
        number,
        title: format!("Change {number}"),
        labels: labels.iter().map(ToString::to_string).collect(),
        head_ref: format!("feature-{number}"),
        base_ref: "main".to_string(),
        head_sha: format!("sha{number}"),
        state: PrState::Open,
        is_draft: false,
        created_at: base_time() + ChronoDuration::minutes(created_offset_mins),
        html_url: format!("https://github.com/acme/widgets/pull/{number}"),
    }
}

/// Review submitted `offset_mins` after [`base_time`]
pub fn review(reviewer: &str, state: ReviewState, offset_mins: i64) -> Review {
    Review {
        reviewer: reviewer.to_string(),
        state,
        submitted_at: Some(base_time() + ChronoDuration::minutes(offset_mins)),
    }
}

/// Approving review
pub fn approve(reviewer: &str, offset_mins: i64) -> Review {
    review(reviewer, ReviewState::Approved, offset_mins)
}

/// Review requesting changes
pub fn request_changes(reviewer: &str, offset_mins: i64) -> Review {
    review(reviewer, ReviewState::ChangesRequested, offset_mins)
}

/// Completed check run
pub fn completed_check(name: &str, conclusion: CheckConclusion) -> CheckRun {
    CheckRun {
        name: name.to_string(),
        status: CheckStatus::Completed,
        conclusion: Some(conclusion),
        head_sha: "any".to_string(),
    }
}

/// Check run that has not finished
pub fn running_check(name: &str) -> CheckRun {
    CheckRun {
        name: name.to_string(),
        status: CheckStatus::InProgress,
        conclusion: None,
        head_sha: "any".to_string(),
    }
}

/// Clock that only moves when slept on
pub struct FakeClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Number of sleeps so far
    pub fn sleep_count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }

    /// All sleeps so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Total simulated time
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Progress sink that records everything it is told
#[derive(Default)]
pub struct RecordingProgress {
    pub messages: Mutex<Vec<String>>,
    pub started: Mutex<Vec<u64>>,
    pub finished: Mutex<Vec<u64>>,
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    async fn on_candidate_start(&self, candidate: &PullRequestCandidate) {
        self.started.lock().unwrap().push(candidate.number);
    }

    async fn on_outcome(&self, report: &CandidateReport) {
        self.finished.lock().unwrap().push(report.number);
    }
}
