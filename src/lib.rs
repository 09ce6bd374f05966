//! pr-automerge: label- and review-gated auto-merge for GitHub pull requests
//!
//! One sequential pass over a repository's open PRs: each candidate is
//! re-fetched, gated on its label and reviews, synced with its base,
//! held until external checks settle, and merged.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod types;
