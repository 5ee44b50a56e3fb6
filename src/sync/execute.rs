//! Sync execution
//!
//! Replays the planned groups onto a working branch, publishes them, then
//! moves the original branch onto the result. The whole run is raced against
//! an interrupt future; losing the race, or failing, restores the original
//! branch through [`restore`].

use crate::error::{Error, Result};
use crate::git::GitService;
use crate::metadata;
use crate::platform::PlatformService;
use crate::summary;
use crate::sync::{Phase, ProgressCallback, PushStatus, SyncContext, SyncPlan, restore};
use crate::types::{Group, PullRequest};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No group was dirty, nothing was touched
    UpToDate,
    /// Groups were replayed and the original branch moved
    Synced,
}

/// Result of sync execution
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// How the run ended
    pub outcome: SyncOutcome,
    /// Groups that were replayed, oldest first
    pub rebased_groups: Vec<String>,
    /// Group branches that were pushed
    pub pushed: Vec<String>,
    /// PRs that were created
    pub created_prs: Vec<PullRequest>,
    /// PRs whose base or body was edited
    pub updated_prs: Vec<PullRequest>,
}

impl SyncResult {
    const fn new(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            rebased_groups: Vec::new(),
            pushed: Vec::new(),
            created_prs: Vec::new(),
            updated_prs: Vec::new(),
        }
    }

    /// Record an edited PR, replacing an earlier edit of the same PR
    fn record_update(&mut self, pr: PullRequest) {
        self.updated_prs.retain(|p| p.number != pr.number);
        self.updated_prs.push(pr);
    }
}

/// State the rollback path needs after the run future is dropped
struct RunState {
    created_branches: Vec<String>,
    finalized: bool,
    result: SyncResult,
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Execute a sync plan
///
/// A plan with nothing dirty returns immediately without calling git or the
/// platform. Otherwise the run races `interrupt`: if the interrupt completes
/// first the in-flight command is dropped, rollback runs and
/// [`Error::Interrupted`] is returned. A failure also rolls back and is
/// returned wrapped in [`Error::Restored`].
///
/// Uncommitted changes to tracked files fail with [`Error::Precondition`]
/// before anything is touched, since rollback could not bring them back.
pub async fn execute_sync<F>(
    plan: &SyncPlan,
    ctx: &SyncContext,
    git: &dyn GitService,
    platform: &dyn PlatformService,
    progress: &dyn ProgressCallback,
    interrupt: F,
) -> Result<SyncResult>
where
    F: Future<Output = ()>,
{
    if plan.is_noop() {
        info!(branch = %ctx.branch_name, "stack is up to date");
        return Ok(SyncResult::new(SyncOutcome::UpToDate));
    }

    if git.has_uncommitted_changes().await? {
        return Err(Error::Precondition(
            "working tree has uncommitted changes; commit or stash them first".to_string(),
        ));
    }

    let state = Mutex::new(RunState {
        created_branches: Vec::new(),
        finalized: false,
        result: SyncResult::new(SyncOutcome::Synced),
    });

    let outcome = {
        let run = Run {
            plan,
            ctx,
            git,
            platform,
            progress,
            state: &state,
        }
        .execute();
        let mut run = std::pin::pin!(run);
        let mut interrupt = std::pin::pin!(interrupt);

        tokio::select! {
            biased;
            () = &mut interrupt => None,
            res = &mut run => Some(res),
        }
    };

    let state = state.into_inner().unwrap_or_else(PoisonError::into_inner);
    let rollback = |original_head: Option<&str>| {
        let report = restore(
            git,
            &ctx.branch_name,
            original_head,
            &plan.working_branch,
            &state.created_branches,
        );
        progress.on_restore(&report);
    };

    match outcome {
        Some(Ok(())) => Ok(state.result),
        Some(Err(e)) => {
            warn!(error = %e, "sync failed, restoring original branch");
            rollback(Some(ctx.head_sha.as_str()));
            Err(Error::Restored(Box::new(e)))
        }
        None if state.finalized => {
            // The branch already points at the replayed stack; only cleanup is left
            warn!("interrupted during cleanup");
            rollback(None);
            Ok(state.result)
        }
        None => {
            warn!("interrupted, restoring original branch");
            rollback(Some(ctx.head_sha.as_str()));
            Err(Error::Interrupted)
        }
    }
}

/// One sync run, steps 2 through 5
struct Run<'a> {
    plan: &'a SyncPlan,
    ctx: &'a SyncContext,
    git: &'a dyn GitService,
    platform: &'a dyn PlatformService,
    progress: &'a dyn ProgressCallback,
    state: &'a Mutex<RunState>,
}

/// PR bookkeeping while publishing
struct Stack<'a> {
    /// Published groups, oldest first
    groups: Vec<&'a Group>,
    /// PR URL per published group, the group id until a PR exists
    urls: Vec<String>,
    /// Latest known PR per group id
    prs: HashMap<String, PullRequest>,
}

impl<'a> Stack<'a> {
    fn new(ctx: &'a SyncContext) -> Self {
        let groups: Vec<&Group> = ctx.range.published_groups().collect();
        let urls = groups.iter().map(|g| g.url_or_id().to_string()).collect();
        let prs = groups
            .iter()
            .filter_map(|g| g.pull_request.clone().map(|pr| (g.id.clone(), pr)))
            .collect();
        Self { groups, urls, prs }
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| Error::Internal(format!("group {id} is not in the stack")))
    }
}

impl Run<'_> {
    async fn execute(self) -> Result<()> {
        let options = self.plan.options;
        let total = self.ctx.range.group_list.len();
        let start = self.plan.start_index.unwrap_or_default();
        let mut stack = Stack::new(self.ctx);

        self.progress.on_phase(Phase::Rebasing).await;
        self.git
            .checkout_new_branch(&self.plan.working_branch, &self.plan.rebase_base)
            .await?;

        for (offset, group) in self.plan.groups(self.ctx).iter().enumerate() {
            self.progress.on_group(start + offset, total, group).await;
            self.replay_group(group).await?;
            lock(self.state).result.rebased_groups.push(group.id.clone());

            if group.is_unassigned() {
                self.progress
                    .on_message("unassigned commits stay local")
                    .await;
                continue;
            }
            if !options.publish {
                continue;
            }
            self.publish_group(group, &mut stack).await?;
        }

        if options.publish {
            self.progress.on_phase(Phase::UpdatingBodies).await;
            self.repair_bodies(&mut stack).await?;
        }

        self.progress.on_phase(Phase::Finalizing).await;
        self.git
            .move_branch(&self.ctx.branch_name, &self.plan.working_branch)
            .await?;
        lock(self.state).finalized = true;
        info!(branch = %self.ctx.branch_name, "moved branch onto replayed stack");

        self.cleanup().await;
        self.progress.on_phase(Phase::Complete).await;
        Ok(())
    }

    /// Cherry-pick a group's commits, re-stamping messages whose marker is stale
    async fn replay_group(&self, group: &Group) -> Result<()> {
        let target = (!group.is_unassigned()).then_some(group.id.as_str());

        for commit in &group.commits {
            self.git
                .cherry_pick(&commit.sha, self.plan.options.verify)
                .await?;

            if commit.embedded_group_id.as_deref() != target {
                debug!(
                    sha = commit.short_sha(),
                    from = ?commit.embedded_group_id,
                    to = ?target,
                    "re-stamping commit"
                );
                let message = target.map_or_else(
                    || metadata::remove(&commit.message),
                    |id| metadata::encode(&commit.message, id),
                );
                self.git.amend_message(&message).await?;
            }
        }
        Ok(())
    }

    /// Push a group branch and create or update its PR
    async fn publish_group(&self, group: &Group, stack: &mut Stack<'_>) -> Result<()> {
        let id = group.id.as_str();

        self.progress.on_push(id, PushStatus::Started).await;
        if let Err(e) = self
            .git
            .push_force(&self.ctx.remote, id, self.plan.options.verify)
            .await
        {
            self.progress
                .on_push(id, PushStatus::Failed(e.to_string()))
                .await;
            return Err(e);
        }
        self.progress.on_push(id, PushStatus::Success).await;
        lock(self.state).result.pushed.push(id.to_string());

        if let Some(pr) = stack.prs.get(id).cloned() {
            let body = summary::write(&pr.body, &stack.urls, &pr.url);
            if pr.base == group.base && body == pr.body {
                debug!(group = id, number = pr.number, "PR already up to date");
                self.progress
                    .on_message(&format!("PR #{} already up to date", pr.number))
                    .await;
                return Ok(());
            }

            let updated = self.platform.update_pr(pr.number, &group.base, &body).await?;
            self.progress.on_pr_updated(id, &updated).await;
            lock(self.state).result.record_update(updated.clone());
            stack.prs.insert(id.to_string(), updated);
            return Ok(());
        }

        // A stale local branch with this name would block cutting a new one
        if let Err(e) = self.git.delete_branch(id).await {
            debug!(group = id, error = %e, "no stale local branch");
        }
        lock(self.state).created_branches.push(id.to_string());
        self.git
            .checkout_new_branch(id, &self.plan.working_branch)
            .await?;

        let pr = self
            .platform
            .create_pr(id, &group.base, &group.title, "")
            .await?;
        if pr.url.is_empty() {
            return Err(Error::Platform(format!(
                "creating a PR for {id} returned no URL"
            )));
        }

        let position = stack.position(id)?;
        stack.urls[position].clone_from(&pr.url);
        self.git.checkout(&self.plan.working_branch).await?;

        self.progress.on_pr_created(id, &pr).await;
        lock(self.state).result.created_prs.push(pr.clone());
        stack.prs.insert(id.to_string(), pr);
        Ok(())
    }

    /// Re-render every PR body against the final URL list
    ///
    /// PRs published before a later group got its URL still list that group
    /// by id; this pass replaces the placeholders.
    async fn repair_bodies(&self, stack: &mut Stack<'_>) -> Result<()> {
        let groups = stack.groups.clone();
        for group in groups {
            let Some(pr) = stack.prs.get(&group.id).cloned() else {
                continue;
            };

            let body = summary::write(&pr.body, &stack.urls, &pr.url);
            if body == pr.body {
                continue;
            }

            let updated = self.platform.update_pr(pr.number, &group.base, &body).await?;
            self.progress.on_pr_updated(&group.id, &updated).await;
            lock(self.state).result.record_update(updated.clone());
            stack.prs.insert(group.id.clone(), updated);
        }
        Ok(())
    }

    /// Return to the original branch and drop the transient branches
    ///
    /// The stack is already published at this point, so failures are only
    /// reported.
    async fn cleanup(&self) {
        if let Err(e) = self.git.checkout(&self.ctx.branch_name).await {
            warn!(error = %e, "could not check out original branch");
            self.progress.on_error(&e).await;
        }

        let created = lock(self.state).created_branches.clone();
        let transient = std::iter::once(&self.plan.working_branch).chain(created.iter());
        for branch in transient {
            if let Err(e) = self.git.delete_branch(branch).await {
                warn!(branch = %branch, error = %e, "could not delete branch");
                self.progress.on_error(&e).await;
            }
        }
    }
}
