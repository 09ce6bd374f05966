//! Check-status poller
//!
//! `evaluate_checks` is the pure transition rule; `wait_for_checks` drives
//! it on an injected [`Clock`] until a terminal verdict or the timeout.
//! `wait_for_head_change` uses the same clock and policy to wait for an
//! accepted branch update to land.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::CheckRun;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default delay between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default total time to wait for checks
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(900);

/// Check name of the workflow job running this tool
pub const DEFAULT_SELF_CHECK: &str = "automerge";

/// Time source for the poller
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic time
    fn now(&self) -> Instant;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How long and how often to poll, and which checks to ignore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two polls
    pub interval: Duration,
    /// Give up once this much time has passed with checks still running
    pub timeout: Duration,
    /// Check names never waited on (our own workflow job would wait on itself)
    pub excluded_checks: BTreeSet<String>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            excluded_checks: BTreeSet::from([DEFAULT_SELF_CHECK.to_string()]),
        }
    }
}

impl PollPolicy {
    /// Upper bound on the number of sleeps before the timeout verdict
    pub fn max_sleeps(&self) -> u128 {
        if self.interval.is_zero() {
            return 0;
        }
        self.timeout.as_millis().div_ceil(self.interval.as_millis())
    }
}

/// Verdict for one snapshot of check runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckVerdict {
    /// Nothing to wait for, or everything passed
    Succeeded,
    /// Everything finished and something did not pass
    Failed {
        /// Names of non-passing checks
        failing: Vec<String>,
    },
    /// Some checks still running
    Pending {
        /// Names of incomplete checks
        pending: Vec<String>,
    },
}

/// Evaluate one snapshot of check runs
///
/// Excluded names are dropped first. No remaining runs means there is
/// nothing to wait for, which counts as success. A failure is only
/// declared once every remaining run has completed.
pub fn evaluate_checks(runs: &[CheckRun], excluded: &BTreeSet<String>) -> CheckVerdict {
    let relevant: Vec<&CheckRun> = runs
        .iter()
        .filter(|r| !excluded.contains(&r.name))
        .collect();

    if relevant.is_empty() {
        return CheckVerdict::Succeeded;
    }

    let pending: Vec<String> = relevant
        .iter()
        .filter(|r| !r.is_completed())
        .map(|r| r.name.clone())
        .collect();
    if !pending.is_empty() {
        return CheckVerdict::Pending { pending };
    }

    let failing: Vec<String> = relevant
        .iter()
        .filter(|r| !r.is_passing())
        .map(|r| r.name.clone())
        .collect();
    if failing.is_empty() {
        CheckVerdict::Succeeded
    } else {
        CheckVerdict::Failed { failing }
    }
}

/// Terminal state of the poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// All relevant checks passed (or none exist)
    Succeeded,
    /// All relevant checks completed, some did not pass
    Failed {
        /// Names of non-passing checks
        failing: Vec<String>,
    },
    /// Timeout reached with checks still running
    TimedOut {
        /// Names of checks still incomplete at the deadline
        pending: Vec<String>,
    },
}

/// Poll check runs for `sha` until they settle or the timeout expires
///
/// The first poll happens immediately. Between polls the poller sleeps one
/// interval on `clock`, never past the deadline. Platform errors end the
/// poll and are returned to the caller.
pub async fn wait_for_checks(
    platform: &dyn PlatformService,
    clock: &dyn Clock,
    sha: &str,
    policy: &PollPolicy,
) -> Result<PollOutcome> {
    let started = clock.now();
    let mut tick: u64 = 0;

    loop {
        tick += 1;
        let runs = platform.list_check_runs(sha).await?;

        match evaluate_checks(&runs, &policy.excluded_checks) {
            CheckVerdict::Succeeded => {
                debug!(sha, tick, "checks succeeded");
                return Ok(PollOutcome::Succeeded);
            }
            CheckVerdict::Failed { failing } => {
                debug!(sha, tick, ?failing, "checks failed");
                return Ok(PollOutcome::Failed { failing });
            }
            CheckVerdict::Pending { pending } => {
                let elapsed = clock.now().saturating_duration_since(started);
                if elapsed >= policy.timeout {
                    info!(sha, tick, elapsed_secs = elapsed.as_secs(), ?pending, "checks timed out");
                    return Ok(PollOutcome::TimedOut { pending });
                }

                let wait = policy.interval.min(policy.timeout - elapsed);
                debug!(sha, tick, ?pending, wait_secs = wait.as_secs(), "checks pending");
                clock.sleep(wait).await;
            }
        }
    }
}

/// Re-fetch a PR until its head moves away from `old_sha`
///
/// GitHub accepts a branch update before the merge commit exists, so the
/// head can still be `old_sha` right after the update. The first fetch is
/// immediate; later ones follow `policy.interval`. Returns the new head sha,
/// or `None` if it did not move before `policy.timeout`.
pub async fn wait_for_head_change(
    platform: &dyn PlatformService,
    clock: &dyn Clock,
    pr_number: u64,
    old_sha: &str,
    policy: &PollPolicy,
) -> Result<Option<String>> {
    let started = clock.now();

    loop {
        let pr = platform.get_pr(pr_number).await?;
        if pr.head_sha != old_sha {
            debug!(pr_number, old_sha, new_sha = %pr.head_sha, "head moved");
            return Ok(Some(pr.head_sha));
        }

        let elapsed = clock.now().saturating_duration_since(started);
        if elapsed >= policy.timeout {
            info!(pr_number, old_sha, elapsed_secs = elapsed.as_secs(), "head never moved");
            return Ok(None);
        }

        let wait = policy.interval.min(policy.timeout - elapsed);
        debug!(pr_number, old_sha, wait_secs = wait.as_secs(), "waiting for branch update");
        clock.sleep(wait).await;
    }
}
