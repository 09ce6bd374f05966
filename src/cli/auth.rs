//! Auth command - verify the GitHub token

use crate::cli::style::{Stylize, check};
use anstream::println;
use pr_automerge::auth::{get_github_auth, test_github_auth};
use pr_automerge::error::Result;
use pr_automerge::platform::GitHubService;

/// Resolve the token and ask GitHub who it belongs to
pub async fn run_auth(host: Option<&str>) -> Result<()> {
    let auth = get_github_auth(host).await?;
    // Owner and repo are not needed for /user
    let service = GitHubService::new(
        &auth.token,
        String::new(),
        String::new(),
        host.map(ToString::to_string),
    )?;

    let login = test_github_auth(&service).await?;
    println!(
        "{} Authenticated as {} {}",
        check(),
        login.accent(),
        format!("(token from {})", auth.source).muted()
    );
    Ok(())
}
