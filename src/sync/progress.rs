//! Progress callback trait for interface-agnostic updates
//!
//! The CLI renders these as spinner and status lines; tests use
//! [`NoopProgress`].

use crate::error::Error;
use crate::sync::RestoreReport;
use crate::types::{Group, PullRequest};
use async_trait::async_trait;

/// Sync phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Replaying commits onto the working branch
    Rebasing,
    /// Re-rendering stack tables in every PR body
    UpdatingBodies,
    /// Moving the original branch and cleaning up
    Finalizing,
    /// Sync complete
    Complete,
}

/// Push operation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Push started
    Started,
    /// Push succeeded
    Success,
    /// Push failed with error message
    Failed(String),
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a sync.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called before a group is replayed (`index` counts from zero)
    async fn on_group(&self, index: usize, total: usize, group: &Group);

    /// Called when a group branch is being pushed
    async fn on_push(&self, group_id: &str, status: PushStatus);

    /// Called when a PR is created
    async fn on_pr_created(&self, group_id: &str, pr: &PullRequest);

    /// Called when a PR is updated
    async fn on_pr_updated(&self, group_id: &str, pr: &PullRequest);

    /// Called when an error occurs (non-fatal)
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);

    /// Called after rollback; never awaited so it can run on the restore path
    fn on_restore(&self, report: &RestoreReport);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_group(&self, _index: usize, _total: usize, _group: &Group) {}
    async fn on_push(&self, _group_id: &str, _status: PushStatus) {}
    async fn on_pr_created(&self, _group_id: &str, _pr: &PullRequest) {}
    async fn on_pr_updated(&self, _group_id: &str, _pr: &PullRequest) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
    fn on_restore(&self, _report: &RestoreReport) {}
}
