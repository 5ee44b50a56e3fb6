//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::{COMMITS_PER_PAGE, PlatformService, collect_pages};
use crate::types::{Platform, PlatformConfig, PullRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    host: String,
    config: PlatformConfig,
    project_path: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct MrCommit {
    id: String,
}

#[derive(Serialize)]
struct CreateMrPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct UpdateMrPayload<'a> {
    target_branch: &'a str,
    description: &'a str,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Self {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());
        let project_path = format!("{owner}/{repo}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            host: host.clone(),
            config: PlatformConfig {
                platform: Platform::GitLab,
                owner,
                repo,
                host: if host == "gitlab.com" {
                    None
                } else {
                    Some(host)
                },
            },
            project_path,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("https://{}/api/v4{}", self.host, path)
    }

    fn mr_url(&self, suffix: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests{suffix}",
            urlencoding::encode(&self.project_path)
        ))
    }

    /// Commit shas of an MR, oldest first
    async fn mr_commits(&self, iid: u64) -> Result<Vec<String>> {
        let url = self.mr_url(&format!("/{iid}/commits"));
        let url = url.as_str();
        let commits = collect_pages(COMMITS_PER_PAGE, |page| async move {
            let batch: Vec<MrCommit> = self
                .client
                .get(url)
                .header("PRIVATE-TOKEN", &self.token)
                .query(&[("per_page", COMMITS_PER_PAGE), ("page", page)])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?
                .json()
                .await?;
            Ok::<_, Error>(batch)
        })
        .await?;

        // GitLab lists newest first
        Ok(commits.into_iter().rev().map(|c| c.id).collect())
    }
}

fn to_pull_request(mr: MergeRequest, commits: Vec<String>) -> PullRequest {
    PullRequest {
        number: mr.iid,
        url: mr.web_url,
        title: mr.title,
        body: mr.description.unwrap_or_default(),
        base: mr.target_branch,
        head: mr.source_branch,
        commits,
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        let mrs: Vec<MergeRequest> = self
            .client
            .get(self.mr_url(""))
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("source_branch", head_branch), ("state", "opened")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let Some(mr) = mrs.into_iter().next() else {
            return Ok(None);
        };

        let commits = self.mr_commits(mr.iid).await?;
        Ok(Some(to_pull_request(mr, commits)))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let payload = CreateMrPayload {
            source_branch: head,
            target_branch: base,
            title,
            description: body,
        };

        let mr: MergeRequest = self
            .client
            .post(self.mr_url(""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        Ok(to_pull_request(mr, Vec::new()))
    }

    async fn update_pr(&self, pr_number: u64, base: &str, body: &str) -> Result<PullRequest> {
        let payload = UpdateMrPayload {
            target_branch: base,
            description: body,
        };

        let mr: MergeRequest = self
            .client
            .put(self.mr_url(&format!("/{pr_number}")))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        Ok(to_pull_request(mr, Vec::new()))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mr_url_encodes_nested_project() {
        let service = GitLabService::new(
            "token".to_string(),
            "group/subgroup".to_string(),
            "repo".to_string(),
            None,
        );
        assert_eq!(
            service.mr_url("/7/commits"),
            "https://gitlab.com/api/v4/projects/group%2Fsubgroup%2Frepo/merge_requests/7/commits"
        );
        assert!(service.config().host.is_none());
    }

    #[test]
    fn test_merge_request_without_description() {
        let mr: MergeRequest = serde_json::from_str(
            r#"{"iid":3,"web_url":"https://gitlab.com/g/r/-/merge_requests/3",
                "source_branch":"feat","target_branch":"main","title":"Feat",
                "description":null}"#,
        )
        .unwrap();
        let pr = to_pull_request(mr, vec!["a".to_string()]);
        assert_eq!(pr.number, 3);
        assert_eq!(pr.body, "");
        assert_eq!(pr.remote_commit_count(), 1);
    }
}
