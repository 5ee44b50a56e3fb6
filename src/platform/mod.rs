//! Platform services for GitHub and GitLab
//!
//! Provides a unified interface for the PR/MR operations the sync engine
//! needs: look up the PR for a group branch, create one, and edit its base
//! and body.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::{detect_platform, parse_repo_info, select_remote};
pub use factory::create_platform_service;
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{PlatformConfig, PullRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Page size for PR commit listings
pub(crate) const COMMITS_PER_PAGE: usize = 100;

/// Platform service trait for PR/MR operations
///
/// This trait abstracts GitHub and GitLab operations, allowing the same
/// sync logic to work with either platform.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Find the open PR whose head is `head_branch`, with body and commits
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>>;

    /// Create a new PR
    async fn create_pr(&self, head: &str, base: &str, title: &str, body: &str)
    -> Result<PullRequest>;

    /// Update the base branch and body of an existing PR
    async fn update_pr(&self, pr_number: u64, base: &str, body: &str) -> Result<PullRequest>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}

/// Look up the open PR for each branch
///
/// Branches without an open PR are absent from the returned map.
pub async fn fetch_pull_requests<'a, I>(
    platform: &dyn PlatformService,
    branches: I,
) -> Result<HashMap<String, PullRequest>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut prs = HashMap::new();
    for branch in branches {
        if prs.contains_key(branch) {
            continue;
        }
        if let Some(pr) = platform.find_existing_pr(branch).await? {
            debug!(branch, number = pr.number, "found existing PR");
            prs.insert(branch.to_string(), pr);
        }
    }
    Ok(prs)
}

/// Fetch a paginated list, one page at a time, starting at page 1
///
/// Stops after the first page holding fewer than `per_page` entries.
pub(crate) async fn collect_pages<T, F, Fut>(per_page: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    for page in 1.. {
        let batch = fetch(page).await?;
        let last = batch.len() < per_page;
        items.extend(batch);
        if last {
            break;
        }
    }
    Ok(items)
}
