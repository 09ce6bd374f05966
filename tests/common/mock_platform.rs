//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use pr_automerge::error::{Error, Result};
use pr_automerge::platform::PlatformService;
use pr_automerge::types::{
    BranchUpdate, CheckRun, MergeMethod, MergeResult, PlatformConfig, PullRequestCandidate, Review,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Call record for `update_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBranchCall {
    pub pr_number: u64,
    pub expected_head_sha: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
    pub commit_title: String,
    pub head_sha: String,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// because mockall has issues with methods returning references.
///
/// Features:
/// - PRs keyed by number; `get_pr` serves the stored snapshot
/// - A separate, optional snapshot for `list_open_prs` (stale labels)
/// - Check run sequences per sha; the last entry repeats forever
/// - Branch updates move the head sha, immediately or after some fetches
/// - Call tracking (per method and one ordered log)
/// - Error injection per PR
pub struct MockPlatformService {
    config: PlatformConfig,
    prs: Mutex<HashMap<u64, PullRequestCandidate>>,
    listed_prs: Mutex<HashMap<u64, PullRequestCandidate>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    check_runs: Mutex<HashMap<String, VecDeque<Vec<CheckRun>>>>,
    branch_updates: Mutex<HashMap<u64, BranchUpdate>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    head_move_delays: Mutex<HashMap<u64, usize>>,
    // `get_pr` calls left before an accepted update shows up
    pending_head_moves: Mutex<HashMap<u64, usize>>,
    // Call tracking
    call_log: Mutex<Vec<String>>,
    get_pr_calls: Mutex<Vec<u64>>,
    list_reviews_calls: Mutex<Vec<u64>>,
    check_run_calls: Mutex<Vec<String>>,
    update_branch_calls: Mutex<Vec<UpdateBranchCall>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    // Error injection
    error_on_list_open: Mutex<Option<String>>,
    error_on_get_pr: Mutex<HashMap<u64, String>>,
    error_on_check_runs: Mutex<Option<String>>,
    error_on_update_branch: Mutex<HashMap<u64, String>>,
    error_on_merge_pr: Mutex<HashMap<u64, String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            prs: Mutex::new(HashMap::new()),
            listed_prs: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            check_runs: Mutex::new(HashMap::new()),
            branch_updates: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            head_move_delays: Mutex::new(HashMap::new()),
            pending_head_moves: Mutex::new(HashMap::new()),
            call_log: Mutex::new(Vec::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            list_reviews_calls: Mutex::new(Vec::new()),
            check_run_calls: Mutex::new(Vec::new()),
            update_branch_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            error_on_list_open: Mutex::new(None),
            error_on_get_pr: Mutex::new(HashMap::new()),
            error_on_check_runs: Mutex::new(None),
            error_on_update_branch: Mutex::new(HashMap::new()),
            error_on_merge_pr: Mutex::new(HashMap::new()),
        }
    }

    // === Response setup ===

    /// Store a PR (served by `get_pr` and, unless overridden, `list_open_prs`)
    pub fn add_pr(&self, pr: PullRequestCandidate) {
        self.prs.lock().unwrap().insert(pr.number, pr);
    }

    /// Make `list_open_prs` return a different snapshot than `get_pr`
    pub fn set_listed_snapshot(&self, pr: PullRequestCandidate) {
        self.listed_prs.lock().unwrap().insert(pr.number, pr);
    }

    /// Set the review history of a PR
    pub fn set_reviews(&self, pr_number: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(pr_number, reviews);
    }

    /// Set the check runs returned for a sha on every poll
    pub fn set_check_runs(&self, sha: &str, runs: Vec<CheckRun>) {
        self.set_check_run_sequence(sha, vec![runs]);
    }

    /// Set successive check run snapshots for a sha; the last one repeats
    pub fn set_check_run_sequence(&self, sha: &str, sequence: Vec<Vec<CheckRun>>) {
        self.check_runs
            .lock()
            .unwrap()
            .insert(sha.to_string(), sequence.into());
    }

    /// Set the branch update result for a PR (default: `Updated`)
    pub fn set_branch_update(&self, pr_number: u64, update: BranchUpdate) {
        self.branch_updates.lock().unwrap().insert(pr_number, update);
    }

    /// After an `Updated` branch update, keep serving the old head for the
    /// next `fetches` calls to `get_pr` (default 0: the head moves at once)
    pub fn delay_head_move(&self, pr_number: u64, fetches: usize) {
        self.head_move_delays
            .lock()
            .unwrap()
            .insert(pr_number, fetches);
    }

    /// After an `Updated` branch update, never move the head
    pub fn freeze_head_after_update(&self, pr_number: u64) {
        self.delay_head_move(pr_number, usize::MAX);
    }

    /// Set the merge response for a PR (default: merged)
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    /// Helper: PR with `approvals` distinct approvals and no checks
    pub fn setup_ready_pr(&self, pr: PullRequestCandidate, approvals: usize) {
        let number = pr.number;
        self.add_pr(pr);
        let reviews = (0..approvals)
            .map(|i| super::approve(&format!("reviewer-{i}"), i64::try_from(i).unwrap()))
            .collect();
        self.set_reviews(number, reviews);
    }

    // === Error injection methods ===

    /// Make `list_open_prs` return an error
    pub fn fail_list_open(&self, msg: &str) {
        *self.error_on_list_open.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_pr` return an error for one PR
    pub fn fail_get_pr(&self, pr_number: u64, msg: &str) {
        self.error_on_get_pr
            .lock()
            .unwrap()
            .insert(pr_number, msg.to_string());
    }

    /// Make `list_check_runs` return an error
    pub fn fail_check_runs(&self, msg: &str) {
        *self.error_on_check_runs.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `update_branch` return an error for one PR
    pub fn fail_update_branch(&self, pr_number: u64, msg: &str) {
        self.error_on_update_branch
            .lock()
            .unwrap()
            .insert(pr_number, msg.to_string());
    }

    /// Make `merge_pr` return an error for one PR
    pub fn fail_merge_pr(&self, pr_number: u64, msg: &str) {
        self.error_on_merge_pr
            .lock()
            .unwrap()
            .insert(pr_number, msg.to_string());
    }

    // === Call verification methods ===

    /// Every call in order, as `method:arg`
    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    /// Calls touching one PR, in order, as method names
    pub fn calls_for(&self, pr_number: u64) -> Vec<String> {
        let suffix = format!(":{pr_number}");
        self.call_log()
            .into_iter()
            .filter_map(|c| c.strip_suffix(&suffix).map(ToString::to_string))
            .collect()
    }

    /// Get all `get_pr` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Get all `list_reviews` calls
    pub fn list_reviews_calls(&self) -> Vec<u64> {
        self.list_reviews_calls.lock().unwrap().clone()
    }

    /// Get all `list_check_runs` calls
    pub fn check_run_calls(&self) -> Vec<String> {
        self.check_run_calls.lock().unwrap().clone()
    }

    /// Get all `update_branch` calls
    pub fn update_branch_calls(&self) -> Vec<UpdateBranchCall> {
        self.update_branch_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Assert that `merge_pr` was called for a specific PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_pr` was NOT called for a specific PR
    pub fn assert_merge_not_called(&self, pr_number: u64) {
        let calls = self.merge_pr_calls();
        assert!(
            !calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) NOT to be called but it was: {calls:?}"
        );
    }

    /// Get count of merge_pr calls
    pub fn merge_call_count(&self) -> usize {
        self.merge_pr_calls.lock().unwrap().len()
    }

    fn move_head(&self, pr_number: u64) {
        if let Some(pr) = self.prs.lock().unwrap().get_mut(&pr_number) {
            pr.head_sha = synced_sha(&pr.head_sha);
        }
    }

    fn log(&self, entry: String) {
        self.call_log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn list_open_prs(&self) -> Result<Vec<PullRequestCandidate>> {
        self.log("list_open_prs".to_string());

        if let Some(msg) = self.error_on_list_open.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let prs = self.prs.lock().unwrap();
        let listed = self.listed_prs.lock().unwrap();
        Ok(prs
            .values()
            .map(|pr| listed.get(&pr.number).unwrap_or(pr).clone())
            .filter(|pr| pr.state == pr_automerge::types::PrState::Open)
            .collect())
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestCandidate> {
        self.log(format!("get_pr:{pr_number}"));
        self.get_pr_calls.lock().unwrap().push(pr_number);

        if let Some(msg) = self.error_on_get_pr.lock().unwrap().get(&pr_number) {
            return Err(Error::Platform(msg.clone()));
        }

        let mut pending = self.pending_head_moves.lock().unwrap();
        if let Some(remaining) = pending.get_mut(&pr_number) {
            if *remaining == 0 {
                pending.remove(&pr_number);
                self.move_head(pr_number);
            } else {
                *remaining -= 1;
            }
        }
        drop(pending);

        self.prs
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| Error::Platform(format!("get_pr: no PR #{pr_number} configured")))
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        self.log(format!("list_reviews:{pr_number}"));
        self.list_reviews_calls.lock().unwrap().push(pr_number);

        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        self.log(format!("list_check_runs:{sha}"));
        self.check_run_calls.lock().unwrap().push(sha.to_string());

        if let Some(msg) = self.error_on_check_runs.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let mut all = self.check_runs.lock().unwrap();
        let Some(sequence) = all.get_mut(sha) else {
            return Ok(Vec::new());
        };
        if sequence.len() > 1 {
            Ok(sequence.pop_front().unwrap_or_default())
        } else {
            Ok(sequence.front().cloned().unwrap_or_default())
        }
    }

    async fn update_branch(&self, pr_number: u64, expected_head_sha: &str) -> Result<BranchUpdate> {
        self.log(format!("update_branch:{pr_number}"));
        self.update_branch_calls
            .lock()
            .unwrap()
            .push(UpdateBranchCall {
                pr_number,
                expected_head_sha: expected_head_sha.to_string(),
            });

        if let Some(msg) = self.error_on_update_branch.lock().unwrap().get(&pr_number) {
            return Err(Error::Platform(msg.clone()));
        }

        let update = self
            .branch_updates
            .lock()
            .unwrap()
            .get(&pr_number)
            .copied()
            .unwrap_or(BranchUpdate::Updated);

        if update == BranchUpdate::Updated {
            let delay = self
                .head_move_delays
                .lock()
                .unwrap()
                .get(&pr_number)
                .copied()
                .unwrap_or(0);
            if delay == 0 {
                self.move_head(pr_number);
            } else {
                self.pending_head_moves
                    .lock()
                    .unwrap()
                    .insert(pr_number, delay);
            }
        }
        Ok(update)
    }

    async fn merge_pr(
        &self,
        pr_number: u64,
        method: MergeMethod,
        commit_title: &str,
        head_sha: &str,
    ) -> Result<MergeResult> {
        self.log(format!("merge_pr:{pr_number}"));
        self.merge_pr_calls.lock().unwrap().push(MergePrCall {
            pr_number,
            method,
            commit_title: commit_title.to_string(),
            head_sha: head_sha.to_string(),
        });

        if let Some(msg) = self.error_on_merge_pr.lock().unwrap().get(&pr_number) {
            return Err(Error::Platform(msg.clone()));
        }

        Ok(self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_else(|| MergeResult {
                merged: true,
                sha: Some(format!("merged_sha_{pr_number}")),
                message: None,
            }))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Head sha the mock assigns after a successful branch update
pub fn synced_sha(sha: &str) -> String {
    format!("{sha}-synced")
}
