//! Shared command context for CLI commands
//!
//! Resolves configuration and authentication and builds the platform
//! service, so commands start from a validated setup.

use pr_automerge::auth::{AuthSource, get_github_auth};
use pr_automerge::config::{ConfigOverrides, MergeConfig, load_config_file, resolve_config};
use pr_automerge::error::Result;
use pr_automerge::platform::{GitHubService, PlatformService};
use std::path::Path;
use tracing::debug;

/// Everything a run needs
pub struct CommandContext {
    /// Resolved configuration
    pub config: MergeConfig,
    /// Platform service (GitHub)
    pub platform: Box<dyn PlatformService>,
    /// Where the token came from
    pub auth_source: AuthSource,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// Configuration is validated before the token is looked up, so a
    /// missing repository fails without touching the network or `gh`.
    pub async fn new(overrides: ConfigOverrides, config_path: Option<&Path>) -> Result<Self> {
        let file = config_path.map(load_config_file).transpose()?;
        let config = resolve_config(overrides, file)?;
        debug!(repo = %config.platform.full_name(), options = ?config.options, "resolved config");

        let auth = get_github_auth(config.platform.host.as_deref()).await?;
        let platform = GitHubService::new(
            &auth.token,
            config.platform.owner.clone(),
            config.platform.repo.clone(),
            config.platform.host.clone(),
        )?;

        Ok(Self {
            config,
            platform: Box::new(platform),
            auth_source: auth.source,
        })
    }
}
