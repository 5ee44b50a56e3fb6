//! Range building
//!
//! Turns the commits between merge-base and `HEAD` plus the current
//! [`CommitAssignment`] into an ordered list of groups, each linked to its
//! pull request and flagged dirty when the remote lags behind.

use crate::error::{Error, Result};
use crate::types::{Commit, CommitAssignment, CommitRange, Group, PullRequest, UNASSIGNED};
use std::collections::HashMap;
use tracing::debug;

/// Everything the range builder needs
#[derive(Debug, Clone)]
pub struct RangeInput<'a> {
    /// Commits between merge-base and `HEAD`, oldest first
    pub commits: &'a [Commit],
    /// Commit to group assignment
    pub assignment: &'a CommitAssignment,
    /// Open pull requests keyed by head branch name
    pub pull_requests: &'a HashMap<String, PullRequest>,
    /// Trunk branch name
    pub trunk: &'a str,
}

/// Derive a [`CommitRange`] from history and assignment
///
/// Consecutive commits resolving to the same group id are coalesced into
/// one group. A group id that reappears after a different id starts a
/// second, separate run.
pub fn build_range(input: &RangeInput<'_>) -> Result<CommitRange> {
    if input.trunk.is_empty() {
        return Err(Error::InvalidRange("trunk branch is missing".to_string()));
    }
    if input.commits.is_empty() {
        return Err(Error::InvalidRange(
            "no commits between merge-base and HEAD".to_string(),
        ));
    }
    if input.assignment.is_empty() {
        return Err(Error::InvalidRange("commit assignment is empty".to_string()));
    }

    // Runs of (group id, commits)
    let mut runs: Vec<(String, Vec<Commit>)> = Vec::new();

    for commit in input.commits {
        let resolved = input
            .assignment
            .get(&commit.sha)
            .ok_or_else(|| {
                Error::InvalidRange(format!("commit {} has no assignment", commit.short_sha()))
            })?
            .unwrap_or(UNASSIGNED);

        match runs.last_mut() {
            Some((id, commits)) if id.as_str() == resolved => commits.push(commit.clone()),
            _ => runs.push((resolved.to_string(), vec![commit.clone()])),
        }
    }

    let mut group_list = Vec::with_capacity(runs.len());
    let mut base = input.trunk.to_string();

    for (id, commits) in runs {
        let pull_request = if id == UNASSIGNED {
            None
        } else {
            input.pull_requests.get(&id).cloned()
        };

        let dirty = id != UNASSIGNED && is_dirty(&commits, pull_request.as_ref());

        let title = pull_request.as_ref().map_or_else(
            || {
                commits
                    .first()
                    .map(Commit::subject)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(id.as_str())
                    .to_string()
            },
            |pr| pr.title.clone(),
        );

        debug!(
            group = %id,
            commits = commits.len(),
            base = %base,
            dirty,
            "derived group"
        );

        let group = Group {
            id,
            commits,
            base: base.clone(),
            title,
            pull_request,
            dirty,
        };

        if !group.is_unassigned() {
            base.clone_from(&group.id);
        }

        group_list.push(group);
    }

    Ok(CommitRange {
        commit_list: input.commits.to_vec(),
        group_list,
        trunk: input.trunk.to_string(),
    })
}

/// Whether a group's commits differ from what its PR last reflected
fn is_dirty(commits: &[Commit], pull_request: Option<&PullRequest>) -> bool {
    let Some(pr) = pull_request else {
        return true;
    };

    pr.commits.len() != commits.len()
        || pr
            .commits
            .iter()
            .zip(commits)
            .any(|(remote, local)| remote != &local.sha)
}

/// Ids of published groups that occur in more than one run
pub fn split_group_ids(range: &CommitRange) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for group in range.published_groups() {
        *seen.entry(group.id.as_str()).or_default() += 1;
    }

    let mut split: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    split.sort();
    split
}
