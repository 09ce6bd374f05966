//! Merge queue engine
//!
//! Pure pieces (review reduction, gates, check evaluation, ordering) are
//! kept apart from the effectful run controller so they can be tested
//! without a platform:
//! 1. Discover - list and order candidates (read-only)
//! 2. Gate - fresh snapshot, label, approvals (pure decisions)
//! 3. Execute - branch update, check polling, merge (effectful)

mod discover;
mod execute;
mod gates;
mod outcome;
mod poll;
mod progress;
mod review;

pub use discover::{discover_candidates, order_fifo};
pub use execute::{
    DEFAULT_REQUIRED_APPROVALS, RunOptions, merge_commit_title, process_candidate,
    run_merge_queue,
};
pub use gates::{is_open_and_ready, label_gate};
pub use outcome::{CandidateReport, FailureReason, ProcessingOutcome, RunReport, SkipReason};
pub use poll::{
    CheckVerdict, Clock, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, DEFAULT_SELF_CHECK,
    PollOutcome, PollPolicy, TokioClock, evaluate_checks, wait_for_checks, wait_for_head_change,
};
pub use progress::{NoopProgress, ProgressCallback};
pub use review::{ApprovalSummary, approval_gate, summarize_reviews};
