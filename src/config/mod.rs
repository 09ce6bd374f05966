//! Run configuration
//!
//! Three layers, highest first: command-line flags (each backed by an
//! environment variable), the optional TOML file, built-in defaults.

mod file;

pub use file::{FileConfig, load_config_file};

use crate::error::{Error, Result};
use crate::merge::{DEFAULT_REQUIRED_APPROVALS, DEFAULT_SELF_CHECK, PollPolicy, RunOptions};
use crate::types::{MergeMethod, PlatformConfig};
use std::time::Duration;

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `owner/repo`
    pub repository: Option<String>,
    /// GitHub Enterprise host
    pub host: Option<String>,
    /// Gating label
    pub label: Option<String>,
    /// Distinct approvals required
    pub required_approvals: Option<usize>,
    /// Seconds between check polls
    pub poll_interval: Option<u64>,
    /// Seconds before giving up on checks
    pub poll_timeout: Option<u64>,
    /// Merge strategy
    pub merge_method: Option<MergeMethod>,
    /// Check names never waited on (empty = not given)
    pub self_checks: Vec<String>,
    /// Evaluate only
    pub dry_run: bool,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// Target repository
    pub platform: PlatformConfig,
    /// Queue policy
    pub options: RunOptions,
}

/// Split `owner/repo`
pub fn parse_repository(value: &str) -> Result<(String, String)> {
    let trimmed = value.trim().trim_end_matches('/');
    match trimmed.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::Config(format!(
            "repository must look like owner/repo, got '{value}'"
        ))),
    }
}

/// Blank strings (e.g. an empty env var in CI) mean "not set"
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Merge the layers and validate the result
///
/// Fails before any remote call when the repository is missing or
/// malformed, or when the poll interval is zero.
pub fn resolve_config(overrides: ConfigOverrides, file: Option<FileConfig>) -> Result<MergeConfig> {
    let file = file.unwrap_or_default();

    let repository = non_blank(overrides.repository)
        .or_else(|| non_blank(file.repository))
        .ok_or_else(|| {
            Error::Config(
                "no repository given; pass --repo or set GITHUB_REPOSITORY".to_string(),
            )
        })?;
    let (owner, repo) = parse_repository(&repository)?;

    let host = non_blank(overrides.host).or_else(|| non_blank(file.host));
    let label = non_blank(overrides.label).or_else(|| non_blank(file.label));

    let interval_secs = overrides
        .poll_interval
        .or(file.poll_interval)
        .unwrap_or_else(|| PollPolicy::default().interval.as_secs());
    if interval_secs == 0 {
        return Err(Error::Config("poll interval must be at least 1 second".to_string()));
    }
    let timeout_secs = overrides
        .poll_timeout
        .or(file.poll_timeout)
        .unwrap_or_else(|| PollPolicy::default().timeout.as_secs());

    let self_checks = if overrides.self_checks.is_empty() {
        file.self_checks
            .unwrap_or_else(|| vec![DEFAULT_SELF_CHECK.to_string()])
    } else {
        overrides.self_checks
    };

    let options = RunOptions {
        label,
        required_approvals: overrides
            .required_approvals
            .or(file.required_approvals)
            .unwrap_or(DEFAULT_REQUIRED_APPROVALS),
        poll: PollPolicy {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
            excluded_checks: self_checks
                .into_iter()
                .filter(|name| !name.trim().is_empty())
                .collect(),
        },
        merge_method: overrides
            .merge_method
            .or(file.merge_method)
            .unwrap_or_default(),
        dry_run: overrides.dry_run,
    };

    Ok(MergeConfig {
        platform: PlatformConfig { owner, repo, host },
        options,
    })
}
