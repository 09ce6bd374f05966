//! Error types for pr-automerge

use thiserror::Error;

/// Errors surfaced by the orchestrator and its platform layer
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration (detected before any remote call)
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable GitHub token
    #[error("authentication error: {0}")]
    Auth(String),

    /// GitHub API returned something we could not use
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform failure (used by test doubles and wrappers)
    #[error("platform error: {0}")]
    Platform(String),

    /// Error bubbled up from octocrab
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Error bubbled up from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
