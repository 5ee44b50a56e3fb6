//! Core types for git-stack

use crate::metadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group id used for commits that do not belong to any group.
///
/// Never published: no branch and no pull request are created for it.
pub const UNASSIGNED: &str = "__git_stack_unassigned__";

/// A commit between the merge-base and `HEAD`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit sha
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Group id recovered from the message marker
    pub embedded_group_id: Option<String>,
}

impl Commit {
    /// Create a commit, decoding its embedded group id from the message
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let embedded_group_id = metadata::decode(&message);
        Self {
            sha: sha.into(),
            message,
            embedded_group_id,
        }
    }

    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    /// Abbreviated sha for display
    pub fn short_sha(&self) -> &str {
        &self.sha[..self.sha.len().min(8)]
    }
}

/// Mutable mapping from commit sha to group id
///
/// `None` means the commit is unassigned. Seeded from each commit's
/// embedded group id and only changed by the range editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitAssignment {
    map: HashMap<String, Option<String>>,
}

impl CommitAssignment {
    /// Seed an assignment from the commits' embedded group ids
    pub fn from_commits(commits: &[Commit]) -> Self {
        let map = commits
            .iter()
            .map(|c| (c.sha.clone(), c.embedded_group_id.clone()))
            .collect();
        Self { map }
    }

    /// Resolved group for a sha; `None` when the sha is unknown
    pub fn get(&self, sha: &str) -> Option<Option<&str>> {
        self.map.get(sha).map(Option::as_deref)
    }

    /// Whether the sha is part of this assignment
    pub fn contains(&self, sha: &str) -> bool {
        self.map.contains_key(sha)
    }

    /// Assign a commit to a group
    pub fn assign(&mut self, sha: &str, group_id: &str) {
        self.map.insert(sha.to_string(), Some(group_id.to_string()));
    }

    /// Move a commit back to the unassigned pool
    pub fn unassign(&mut self, sha: &str) {
        self.map.insert(sha.to_string(), None);
    }

    /// Number of commits tracked
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no commits are tracked
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A pull request / merge request as seen on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Web URL for the PR/MR
    pub url: String,
    /// PR/MR title
    pub title: String,
    /// PR/MR description
    pub body: String,
    /// Base branch name
    pub base: String,
    /// Head branch name
    pub head: String,
    /// Commit shas on the head branch, oldest first
    pub commits: Vec<String>,
}

impl PullRequest {
    /// Number of commits the remote branch carries
    pub fn remote_commit_count(&self) -> usize {
        self.commits.len()
    }
}

/// A named, contiguous run of commits destined for one branch and one PR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group id, also the remote branch name
    pub id: String,
    /// Commits in this group (oldest first)
    pub commits: Vec<Commit>,
    /// Branch this group's PR targets
    pub base: String,
    /// Display / PR title
    pub title: String,
    /// Linked pull request, if one exists
    pub pull_request: Option<PullRequest>,
    /// Whether the remote state lags behind the local commits
    pub dirty: bool,
}

impl Group {
    /// Whether this is the unassigned run
    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED
    }

    /// Commit shas, oldest first
    pub fn shas(&self) -> Vec<&str> {
        self.commits.iter().map(|c| c.sha.as_str()).collect()
    }

    /// Newest commit of the group
    pub fn tip(&self) -> Option<&Commit> {
        self.commits.last()
    }

    /// URL used in stack tables: the PR URL, or the group id as a placeholder
    pub fn url_or_id(&self) -> &str {
        self.pull_request
            .as_ref()
            .map_or(self.id.as_str(), |pr| pr.url.as_str())
    }
}

/// Ordered grouping of the commits between merge-base and `HEAD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    /// Every commit, oldest first
    pub commit_list: Vec<Commit>,
    /// Contiguous runs partitioning `commit_list`, oldest first
    pub group_list: Vec<Group>,
    /// Trunk branch the bottom group targets
    pub trunk: String,
}

impl CommitRange {
    /// Index of the oldest dirty group
    pub fn first_dirty_index(&self) -> Option<usize> {
        self.group_list.iter().position(|g| g.dirty)
    }

    /// Whether every group is in sync with its remote
    pub fn is_synced(&self) -> bool {
        self.first_dirty_index().is_none()
    }

    /// Groups that map to a branch and PR
    pub fn published_groups(&self) -> impl Iterator<Item = &Group> {
        self.group_list.iter().filter(|g| !g.is_unassigned())
    }

    /// Look up a published group by id
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.group_list.iter().find(|g| g.id == id)
    }
}

/// A git remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Detected platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}
