//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{COMMITS_PER_PAGE, PlatformService, collect_pages};
use crate::types::{Platform, PlatformConfig, PullRequest};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::PullRequest as GitHubPullRequest;
use serde::Deserialize;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

/// Entry of `GET /repos/{owner}/{repo}/pulls/{number}/commits`
#[derive(Deserialize)]
struct PrCommit {
    sha: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder.build().map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                platform: Platform::GitHub,
                owner,
                repo,
                host,
            },
        })
    }

    /// Commit shas of a PR, oldest first
    ///
    /// GitHub stops listing after 250 commits, so larger PRs always look
    /// out of date.
    async fn pr_commits(&self, pr_number: u64) -> Result<Vec<String>> {
        let route = format!(
            "/repos/{}/{}/pulls/{pr_number}/commits",
            self.config.owner, self.config.repo
        );
        let route = route.as_str();
        let commits = collect_pages(COMMITS_PER_PAGE, |page| async move {
            let batch: Vec<PrCommit> = self
                .client
                .get(route, Some(&[("per_page", COMMITS_PER_PAGE), ("page", page)]))
                .await?;
            Ok::<_, Error>(batch)
        })
        .await?;
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }
}

fn to_pull_request(pr: &GitHubPullRequest, commits: Vec<String>) -> PullRequest {
    PullRequest {
        number: pr.number,
        url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        body: pr.body.as_deref().unwrap_or_default().to_string(),
        base: pr.base.ref_field.clone(),
        head: pr.head.ref_field.clone(),
        commits,
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        let head = format!("{}:{}", &self.config.owner, head_branch);

        let prs = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(head)
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        let Some(pr) = prs.items.first() else {
            return Ok(None);
        };

        let commits = self.pr_commits(pr.number).await?;
        Ok(Some(to_pull_request(pr, commits)))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        Ok(to_pull_request(&pr, Vec::new()))
    }

    async fn update_pr(&self, pr_number: u64, base: &str, body: &str) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .base(base)
            .body(body)
            .send()
            .await?;

        Ok(to_pull_request(&pr, Vec::new()))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
