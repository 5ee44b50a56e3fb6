//! Blocking rollback
//!
//! Runs when a sync fails or is interrupted after the working branch was
//! created. Only the blocking half of [`GitService`] is used: the interrupt
//! that triggered the rollback may already have killed the async command
//! that was in flight.

use crate::git::GitService;
use tracing::{debug, info, warn};

/// What rollback managed to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Branch that was checked out again
    pub original_branch: String,
    /// Whether the original branch is checked out
    pub restored: bool,
    /// Branches that were deleted
    pub deleted: Vec<String>,
    /// Cleanup steps that failed, as messages
    pub failures: Vec<String>,
}

/// Restore the repository to its pre-run state
///
/// When `original_head` is given the original branch is pointed back at it
/// before it is checked out, in case an interrupted `branch -f` already
/// moved it. Each step tolerates its own failure. A branch that is already
/// gone is not an error.
pub fn restore(
    git: &dyn GitService,
    original_branch: &str,
    original_head: Option<&str>,
    working_branch: &str,
    created_branches: &[String],
) -> RestoreReport {
    let mut report = RestoreReport {
        original_branch: original_branch.to_string(),
        ..RestoreReport::default()
    };

    if let Err(e) = git.abort_cherry_pick_blocking() {
        warn!(error = %e, "could not abort cherry-pick");
        report.failures.push(format!("abort cherry-pick: {e}"));
    }

    if let Some(sha) = original_head {
        if let Err(e) = git.reset_branch_blocking(original_branch, sha) {
            warn!(branch = original_branch, sha, error = %e, "could not reset original branch");
            report
                .failures
                .push(format!("reset {original_branch} to {sha}: {e}"));
        }
    }

    match git.checkout_blocking(original_branch) {
        Ok(()) => report.restored = true,
        Err(e) => {
            warn!(branch = original_branch, error = %e, "could not check out original branch");
            report
                .failures
                .push(format!("checkout {original_branch}: {e}"));
        }
    }

    for branch in std::iter::once(working_branch).chain(created_branches.iter().map(String::as_str))
    {
        match git.delete_branch_blocking(branch) {
            Ok(()) => report.deleted.push(branch.to_string()),
            Err(e) => debug!(branch, error = %e, "branch not deleted"),
        }
    }

    info!(
        branch = original_branch,
        restored = report.restored,
        deleted = report.deleted.len(),
        "rollback finished"
    );
    report
}
