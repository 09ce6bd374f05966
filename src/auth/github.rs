//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use crate::platform::GitHubService;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// A resolved GitHub token
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// The token itself
    pub token: String,
    /// Where it came from
    pub source: AuthSource,
}

/// Resolve a GitHub token
///
/// `GITHUB_TOKEN` wins over `GH_TOKEN`, which wins over `gh auth token`.
/// `host` is passed to `gh` for Enterprise instances.
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    for var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(var)
            && !token.trim().is_empty()
        {
            debug!(var, "using token from environment");
            return Ok(GitHubAuthConfig {
                token: token.trim().to_string(),
                source: AuthSource::EnvVar,
            });
        }
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Auth(format!(
            "no GITHUB_TOKEN or GH_TOKEN set and `gh` could not be run: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no GITHUB_TOKEN or GH_TOKEN set and `gh auth token` failed; run `gh auth login`"
                .to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("`gh auth token` returned an empty token".to_string()));
    }

    debug!("using token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}

/// Check that the token works; returns the authenticated login
pub async fn test_github_auth(service: &GitHubService) -> Result<String> {
    service
        .current_user()
        .await
        .map_err(|e| Error::Auth(format!("token rejected by GitHub: {e}")))
}
