//! CLI command implementations

pub mod auth;
pub mod context;
pub mod run;
pub mod style;

use crate::cli::style::{CHECK, CROSS, Stylize};
use anstream::println;
use async_trait::async_trait;
use indicatif::ProgressBar;
use pr_automerge::merge::{CandidateReport, ProcessingOutcome, ProgressCallback};
use pr_automerge::types::PullRequestCandidate;
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

/// Progress output for the run command
///
/// On a terminal each candidate gets a spinner that is replaced by its
/// outcome line. Elsewhere (CI logs) every message is printed as a line.
pub struct CliProgress {
    interactive: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Pick spinner or plain output depending on stderr
    pub fn detect() -> Self {
        Self {
            interactive: std::io::stderr().is_terminal(),
            spinner: Mutex::new(None),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner.lock().ok().and_then(|mut s| s.take())
    }
}

/// One-line rendering of an outcome
pub fn outcome_line(report: &CandidateReport) -> String {
    let pr = format!("PR #{}", report.number).accent();
    match &report.outcome {
        ProcessingOutcome::Merged { .. } => {
            format!("{} {pr} {}", CHECK.success(), report.outcome.success())
        }
        ProcessingOutcome::WouldMerge => {
            format!("{} {pr} {}", CHECK.success(), report.outcome.muted())
        }
        ProcessingOutcome::Skipped(_) => format!("{} {pr} {}", "-".muted(), report.outcome.warn()),
        ProcessingOutcome::Failed(_) => format!("{} {pr} {}", CROSS.error(), report.outcome.error()),
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        let guard = self.spinner.lock().ok();
        match guard.as_ref().and_then(|s| s.as_ref()) {
            Some(spinner) => spinner.set_message(message.to_string()),
            None => println!("  {}", message.muted()),
        }
    }

    async fn on_candidate_start(&self, candidate: &PullRequestCandidate) {
        let label = format!(
            "{} {}",
            format!("PR #{}", candidate.number).accent(),
            candidate.title
        );
        if self.interactive {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(style::spinner_style());
            spinner.set_message(label);
            spinner.enable_steady_tick(Duration::from_millis(80));
            if let Ok(mut slot) = self.spinner.lock() {
                *slot = Some(spinner);
            }
        } else {
            println!("{label}");
        }
    }

    async fn on_outcome(&self, report: &CandidateReport) {
        if let Some(spinner) = self.take_spinner() {
            spinner.finish_and_clear();
        }
        println!("{}", outcome_line(report));
    }
}
