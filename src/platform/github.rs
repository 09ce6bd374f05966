//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    BranchUpdate, CheckRun, MergeMethod, MergeResult, PlatformConfig, PrState,
    PullRequestCandidate, Review, ReviewState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Page size for every paginated listing
const PER_PAGE: u8 = 100;

/// Check runs page as returned by `GET /commits/{ref}/check-runs`
#[derive(Deserialize)]
struct CheckRunsResponse {
    total_count: usize,
    check_runs: Vec<CheckRun>,
}

/// Error body GitHub sends with 4xx responses
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (check runs, branch update)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API root for raw requests, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `host` selects a GitHub Enterprise instance (`https://{host}/api/v3`).
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::build(token, owner, repo, host, api_base)
    }

    /// Create a service that talks to an arbitrary API root
    ///
    /// Used to point the client at a local test server.
    pub fn with_api_base(token: &str, owner: String, repo: String, api_base: &str) -> Result<Self> {
        Self::build(
            token,
            owner,
            repo,
            None,
            api_base.trim_end_matches('/').to_string(),
        )
    }

    fn build(
        token: &str,
        owner: String,
        repo: String,
        host: Option<String>,
        api_base: String,
    ) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("pr-automerge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig { owner, repo, host },
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    /// Authenticated login, used by `automerge auth`
    pub async fn current_user(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        Ok(user.login)
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Helper to convert an octocrab PR to our candidate type
fn candidate_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequestCandidate {
    // IssueState is non-exhaustive, so anything that is not open counts as closed
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        _ if pr.merged_at.is_some() => PrState::Merged,
        _ => PrState::Closed,
    };

    PullRequestCandidate {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
        head_ref: pr.head.ref_field.clone(),
        base_ref: pr.base.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        state,
        is_draft: pr.draft.unwrap_or(false),
        created_at: pr.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

fn review_from_octocrab(review: &octocrab::models::pulls::Review) -> Option<Review> {
    use octocrab::models::pulls::ReviewState as Octo;

    // Reviews from deleted accounts have no user; they cannot be attributed
    let reviewer = review.user.as_ref()?.login.clone();
    let state = match review.state.as_ref()? {
        Octo::Approved => ReviewState::Approved,
        Octo::ChangesRequested => ReviewState::ChangesRequested,
        Octo::Dismissed => ReviewState::Dismissed,
        Octo::Pending => ReviewState::Pending,
        _ => ReviewState::Commented,
    };

    Some(Review {
        reviewer,
        state,
        submitted_at: review.submitted_at,
    })
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn list_open_prs(&self) -> Result<Vec<PullRequestCandidate>> {
        debug!(repo = %self.config.full_name(), "listing open PRs");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .send()
            .await?;

        let prs = self.client.all_pages(first_page).await?;
        let result: Vec<PullRequestCandidate> = prs.iter().map(candidate_from_octocrab).collect();
        debug!(count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestCandidate> {
        debug!(pr_number, "getting PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await?;

        let candidate = candidate_from_octocrab(&pr);
        debug!(pr_number, state = %candidate.state, head_sha = %candidate.head_sha, "got PR");
        Ok(candidate)
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        debug!(pr_number, "listing reviews");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(pr_number)
            .per_page(PER_PAGE)
            .send()
            .await?;

        let reviews = self.client.all_pages(first_page).await?;
        let result: Vec<Review> = reviews.iter().filter_map(review_from_octocrab).collect();
        debug!(pr_number, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        let url = self.repo_url(&format!("commits/{sha}/check-runs"));
        let mut runs = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .request(Method::GET, &url)
                .query(&[("per_page", u32::from(PER_PAGE)), ("page", page)])
                .send()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to fetch check runs: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::GitHubApi(format!(
                    "check runs for {sha} returned {}",
                    response.status()
                )));
            }

            let body: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            let fetched = body.check_runs.len();
            runs.extend(body.check_runs);

            if fetched == 0 || runs.len() >= body.total_count {
                break;
            }
            page += 1;
        }

        debug!(sha, count = runs.len(), "listed check runs");
        Ok(runs)
    }

    async fn update_branch(&self, pr_number: u64, expected_head_sha: &str) -> Result<BranchUpdate> {
        debug!(pr_number, expected_head_sha, "updating PR branch");
        let url = self.repo_url(&format!("pulls/{pr_number}/update-branch"));

        let response = self
            .request(Method::PUT, &url)
            .json(&json!({ "expected_head_sha": expected_head_sha }))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to update branch: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(pr_number, "branch update accepted");
            return Ok(BranchUpdate::Updated);
        }

        let message = response
            .json::<ApiMessage>()
            .await
            .map(|m| m.message)
            .unwrap_or_default();

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let lower = message.to_ascii_lowercase();
            if lower.contains("conflict") {
                debug!(pr_number, %message, "branch update conflicts");
                return Ok(BranchUpdate::Conflict);
            }
            if lower.contains("no new commits") {
                debug!(pr_number, "branch already up to date");
                return Ok(BranchUpdate::AlreadyUpToDate);
            }
        }

        Err(Error::GitHubApi(format!(
            "Branch update for PR #{pr_number} failed ({status}): {message}"
        )))
    }

    async fn merge_pr(
        &self,
        pr_number: u64,
        method: MergeMethod,
        commit_title: &str,
        head_sha: &str,
    ) -> Result<MergeResult> {
        debug!(pr_number, %method, head_sha, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .merge(pr_number)
            .method(octocrab_method)
            .title(commit_title)
            .sha(head_sha)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
