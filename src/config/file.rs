//! Optional TOML configuration file

use crate::error::{Error, Result};
use crate::types::MergeMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings that may be given in the config file
///
/// Every key is optional; command-line flags and environment variables win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
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
    /// merge, squash or rebase
    pub merge_method: Option<MergeMethod>,
    /// Check names never waited on
    pub self_checks: Option<Vec<String>>,
}

/// Load a config file
///
/// The path was asked for explicitly, so a missing file is an error.
pub fn load_config_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
