//! Shared command context
//!
//! Collects everything a run needs before anything is mutated: the
//! repository, resolved config, remote and platform, the commits between
//! the merge-base and `HEAD`, and their pull requests.

use crate::cli::style::spinner_style;
use git_stack::config::{Config, ConfigLayer};
use git_stack::error::{Error, Result};
use git_stack::git::GitCli;
use git_stack::platform::{
    PlatformService, create_platform_service, fetch_pull_requests, parse_repo_info, select_remote,
};
use git_stack::types::{Commit, CommitAssignment, PullRequest};
use indicatif::ProgressBar;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Context for one invocation
pub struct CommandContext {
    /// Repository handle
    pub git: GitCli,
    /// Resolved configuration
    pub config: Config,
    /// Platform service (GitHub/GitLab)
    pub platform: Box<dyn PlatformService>,
    /// Selected remote name
    pub remote_name: String,
    /// Branch checked out at start
    pub branch: String,
    /// Trunk branch name
    pub trunk: String,
    /// Common ancestor of `HEAD` and the remote trunk
    pub merge_base: String,
    /// Commits between merge-base and `HEAD`, oldest first
    pub commits: Vec<Commit>,
    /// Open PRs keyed by group id
    pub pull_requests: HashMap<String, PullRequest>,
}

impl CommandContext {
    /// Open the repository at `path` and gather the run inputs
    pub async fn new(path: &Path, overrides: ConfigLayer) -> Result<Self> {
        let git = GitCli::open(path)?;

        let mut config = Config::load(git.root())?;
        config.apply(overrides);
        debug!(?config, "resolved config");

        let branch = git.current_branch()?;

        let remotes = git.remotes()?;
        let remote = select_remote(&remotes, config.remote.as_deref())?;
        let platform_config = parse_repo_info(&remote.url)?;
        let remote_name = remote.name.clone();

        let trunk = config
            .trunk
            .clone()
            .unwrap_or_else(|| git.default_trunk(&remote_name));
        if branch == trunk {
            return Err(Error::Precondition(format!(
                "'{branch}' is the trunk branch; check out a feature branch first"
            )));
        }

        let merge_base = git.merge_base(&format!("{remote_name}/{trunk}"))?;
        let commits = git.commits_between(&merge_base)?;

        let platform = create_platform_service(&platform_config).await?;

        // Only ids already stamped into commits can have a PR
        let ids: BTreeSet<&str> = commits
            .iter()
            .filter_map(|c| c.embedded_group_id.as_deref())
            .collect();

        let spinner = ProgressBar::new_spinner().with_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message("Fetching pull requests");
        let pull_requests = fetch_pull_requests(platform.as_ref(), ids).await;
        spinner.finish_and_clear();
        let pull_requests = pull_requests?;

        Ok(Self {
            git,
            config,
            platform,
            remote_name,
            branch,
            trunk,
            merge_base,
            commits,
            pull_requests,
        })
    }

    /// Assignment seeded from the commits' embedded group ids
    pub fn assignment(&self) -> CommitAssignment {
        CommitAssignment::from_commits(&self.commits)
    }
}
