//! Test data factories for git-stack types
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use crate::common::mock_platform::pr_url;
use git_stack::metadata;
use git_stack::range::{RangeInput, build_range};
use git_stack::summary;
use git_stack::sync::SyncContext;
use git_stack::types::{Commit, CommitAssignment, CommitRange, PullRequest};
use std::collections::HashMap;

pub const BRANCH: &str = "feature";
pub const TRUNK: &str = "main";
pub const MERGE_BASE: &str = "base000";
pub const REMOTE: &str = "origin";

/// Commit whose message carries `group` as its marker
pub fn make_commit(sha: &str, subject: &str, group: Option<&str>) -> Commit {
    let message = group.map_or_else(
        || subject.to_string(),
        |id| metadata::encode(subject, id),
    );
    Commit::new(sha, message)
}

/// Open PR for `head` whose remote branch holds `commits`
pub fn make_pr(number: u64, head: &str, base: &str, commits: &[&str]) -> PullRequest {
    PullRequest {
        number,
        url: pr_url(number),
        title: format!("PR for {head}"),
        body: String::new(),
        base: base.to_string(),
        head: head.to_string(),
        commits: commits.iter().map(ToString::to_string).collect(),
    }
}

/// Give each PR the stack table it would have after a clean sync
///
/// PRs must be listed in stack order.
pub fn with_current_tables(prs: Vec<PullRequest>) -> Vec<PullRequest> {
    let urls: Vec<String> = prs.iter().map(|pr| pr.url.clone()).collect();
    prs.into_iter()
        .map(|pr| PullRequest {
            body: summary::write("", &urls, &pr.url),
            ..pr
        })
        .collect()
}

/// PRs keyed by head branch
pub fn pr_map(prs: &[PullRequest]) -> HashMap<String, PullRequest> {
    prs.iter().map(|pr| (pr.head.clone(), pr.clone())).collect()
}

/// Range on `main` for the given commits and assignment
pub fn make_range(
    commits: &[Commit],
    assignment: &CommitAssignment,
    prs: &[PullRequest],
) -> CommitRange {
    build_range(&RangeInput {
        commits,
        assignment,
        pull_requests: &pr_map(prs),
        trunk: TRUNK,
    })
    .expect("fixture range is valid")
}

/// Sync context for `feature`, with the assignment seeded from the commits
pub fn make_context(commits: &[Commit], prs: &[PullRequest]) -> SyncContext {
    let assignment = CommitAssignment::from_commits(commits);
    make_context_with(commits, assignment, prs)
}

/// Sync context with an explicit assignment
pub fn make_context_with(
    commits: &[Commit],
    assignment: CommitAssignment,
    prs: &[PullRequest],
) -> SyncContext {
    let range = make_range(commits, &assignment, prs);
    SyncContext::new(range, BRANCH, MERGE_BASE, assignment, REMOTE)
        .expect("fixture context is valid")
}
