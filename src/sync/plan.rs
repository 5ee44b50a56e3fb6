//! Sync planning
//!
//! Validates the run context and decides where replaying starts.

use crate::error::{Error, Result};
use crate::range::split_group_ids;
use crate::types::{CommitAssignment, CommitRange, Group};
use tracing::debug;

/// Number of uuid characters in a working branch suffix
const WORKING_SUFFIX_LEN: usize = 8;

/// Everything a sync run needs, checked up front
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Derived range for the current branch
    pub range: CommitRange,
    /// Branch checked out when the run started
    pub branch_name: String,
    /// Tip of that branch when the run started
    pub head_sha: String,
    /// Common ancestor of the branch and trunk
    pub merge_base: String,
    /// Commit to group assignment the range was built from
    pub assignment: CommitAssignment,
    /// Remote group branches are pushed to
    pub remote: String,
}

impl SyncContext {
    /// Validate the run context
    ///
    /// Fails with [`Error::Precondition`] before anything is mutated when a
    /// piece is missing, and with [`Error::NonContiguousGroup`] when a group
    /// id occurs in more than one run.
    pub fn new(
        range: CommitRange,
        branch_name: impl Into<String>,
        merge_base: impl Into<String>,
        assignment: CommitAssignment,
        remote: impl Into<String>,
    ) -> Result<Self> {
        let branch_name = branch_name.into();
        let merge_base = merge_base.into();
        let remote = remote.into();

        if branch_name.is_empty() {
            return Err(Error::Precondition("original branch name is missing".into()));
        }
        if merge_base.is_empty() {
            return Err(Error::Precondition("merge-base is missing".into()));
        }
        if remote.is_empty() {
            return Err(Error::Precondition("remote is missing".into()));
        }
        if range.group_list.is_empty() {
            return Err(Error::Precondition("commit range has no groups".into()));
        }
        if assignment.is_empty() {
            return Err(Error::Precondition("commit assignment is missing".into()));
        }
        if let Some(commit) = range
            .commit_list
            .iter()
            .find(|c| !assignment.contains(&c.sha))
        {
            return Err(Error::Precondition(format!(
                "commit {} is missing from the assignment",
                commit.short_sha()
            )));
        }
        if let Some(id) = split_group_ids(&range).into_iter().next() {
            return Err(Error::NonContiguousGroup(id));
        }

        // Commits run from the merge-base up to HEAD
        let head_sha = range
            .commit_list
            .last()
            .map(|c| c.sha.clone())
            .ok_or_else(|| Error::Precondition("commit range is empty".into()))?;

        Ok(Self {
            range,
            branch_name,
            head_sha,
            merge_base,
            assignment,
            remote,
        })
    }
}

/// Knobs for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Push branches and create/update PRs
    pub publish: bool,
    /// Run git hooks on cherry-pick and push
    pub verify: bool,
    /// Replay from the bottom group even when nothing is dirty
    pub force: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            publish: true,
            verify: true,
            force: false,
        }
    }
}

/// What a run will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Index of the first group to replay, `None` when nothing is dirty
    pub start_index: Option<usize>,
    /// Commit the working branch is created at
    pub rebase_base: String,
    /// Transient branch the groups are replayed onto
    pub working_branch: String,
    /// Options the plan was made with
    pub options: SyncOptions,
}

impl SyncPlan {
    /// Whether the run has nothing to do
    pub const fn is_noop(&self) -> bool {
        self.start_index.is_none()
    }

    /// Groups that will be replayed, oldest first
    pub fn groups<'a>(&self, ctx: &'a SyncContext) -> &'a [Group] {
        match self.start_index {
            Some(k) => &ctx.range.group_list[k..],
            None => &[],
        }
    }
}

/// Create a sync plan
///
/// Every group after the first dirty one is replayed too, since its base
/// moves when an earlier group is rewritten.
pub fn create_sync_plan(ctx: &SyncContext, options: SyncOptions) -> SyncPlan {
    let groups = &ctx.range.group_list;

    let start_index = if options.force {
        Some(0)
    } else {
        ctx.range.first_dirty_index()
    };

    let rebase_base = match start_index {
        Some(k) if k > 0 => groups[k - 1]
            .tip()
            .map_or_else(|| ctx.merge_base.clone(), |c| c.sha.clone()),
        _ => ctx.merge_base.clone(),
    };

    let plan = SyncPlan {
        start_index,
        rebase_base,
        working_branch: working_branch_name(&ctx.branch_name),
        options,
    };

    debug!(
        start = ?plan.start_index,
        base = %plan.rebase_base,
        working = %plan.working_branch,
        "created sync plan"
    );
    plan
}

/// Transient branch name: `<branch>_<short random id>`
pub fn working_branch_name(branch: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{branch}_{}", &id[..WORKING_SUFFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{RangeInput, build_range};
    use crate::types::{Commit, PullRequest};
    use std::collections::HashMap;

    fn commits() -> Vec<Commit> {
        vec![
            Commit::new("c1", "Scratch"),
            Commit::new("c2", "Parser\n\ngit-stack-id: a"),
            Commit::new("c3", "Lexer\n\ngit-stack-id: a"),
            Commit::new("c4", "Docs\n\ngit-stack-id: b"),
        ]
    }

    fn pr(head: &str, number: u64, commits: &[&str]) -> PullRequest {
        PullRequest {
            number,
            url: format!("https://github.com/o/r/pull/{number}"),
            title: head.to_string(),
            body: String::new(),
            base: "main".to_string(),
            head: head.to_string(),
            commits: commits.iter().map(ToString::to_string).collect(),
        }
    }

    fn context(prs: &HashMap<String, PullRequest>) -> SyncContext {
        let commits = commits();
        let assignment = CommitAssignment::from_commits(&commits);
        let range = build_range(&RangeInput {
            commits: &commits,
            assignment: &assignment,
            pull_requests: prs,
            trunk: "main",
        })
        .unwrap();
        SyncContext::new(range, "feature", "m0", assignment, "origin").unwrap()
    }

    #[test]
    fn test_plan_starts_at_first_dirty_group() {
        let prs = HashMap::from([("a".to_string(), pr("a", 1, &["c2", "c3"]))]);
        let ctx = context(&prs);
        let plan = create_sync_plan(&ctx, SyncOptions::default());

        // [unassigned, a (clean), b (no PR)]
        assert_eq!(plan.start_index, Some(2));
        assert_eq!(plan.rebase_base, "c3");
        assert_eq!(plan.groups(&ctx).len(), 1);
        assert!(plan.working_branch.starts_with("feature_"));
    }

    #[test]
    fn test_context_records_branch_tip() {
        let ctx = context(&HashMap::new());
        assert_eq!(ctx.head_sha, "c4");
    }

    #[test]
    fn test_plan_noop_when_clean() {
        let prs = HashMap::from([
            ("a".to_string(), pr("a", 1, &["c2", "c3"])),
            ("b".to_string(), pr("b", 2, &["c4"])),
        ]);
        let ctx = context(&prs);
        let plan = create_sync_plan(&ctx, SyncOptions::default());
        assert!(plan.is_noop());
        assert!(plan.groups(&ctx).is_empty());
    }

    #[test]
    fn test_force_replays_from_merge_base() {
        let prs = HashMap::from([
            ("a".to_string(), pr("a", 1, &["c2", "c3"])),
            ("b".to_string(), pr("b", 2, &["c4"])),
        ]);
        let ctx = context(&prs);
        let plan = create_sync_plan(
            &ctx,
            SyncOptions {
                force: true,
                ..SyncOptions::default()
            },
        );
        assert_eq!(plan.start_index, Some(0));
        assert_eq!(plan.rebase_base, "m0");
    }

    #[test]
    fn test_context_preconditions() {
        let ctx = context(&HashMap::new());

        let err = SyncContext::new(
            ctx.range.clone(),
            "",
            "m0",
            ctx.assignment.clone(),
            "origin",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        let err = SyncContext::new(
            ctx.range.clone(),
            "feature",
            "m0",
            CommitAssignment::default(),
            "origin",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_context_rejects_split_group() {
        let commits = vec![
            Commit::new("c1", "One\n\ngit-stack-id: a"),
            Commit::new("c2", "Two\n\ngit-stack-id: b"),
            Commit::new("c3", "Three\n\ngit-stack-id: a"),
        ];
        let assignment = CommitAssignment::from_commits(&commits);
        let range = build_range(&RangeInput {
            commits: &commits,
            assignment: &assignment,
            pull_requests: &HashMap::new(),
            trunk: "main",
        })
        .unwrap();

        let err = SyncContext::new(range, "feature", "m0", assignment, "origin").unwrap_err();
        assert!(matches!(err, Error::NonContiguousGroup(id) if id == "a"));
    }

    #[test]
    fn test_working_branch_names_are_unique() {
        let first = working_branch_name("feature");
        let second = working_branch_name("feature");
        assert_ne!(first, second);
        assert_eq!(first.len(), "feature_".len() + WORKING_SUFFIX_LEN);
    }
}
