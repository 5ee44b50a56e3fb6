//! Mock git service for testing
//!
//! Simulates local branches and the checked-out branch, records every call,
//! and can fail or hang on chosen operations.

#![allow(dead_code)]

use async_trait::async_trait;
use git_stack::error::{Error, Result};
use git_stack::git::GitService;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    CheckoutNewBranch { branch: String, start: String },
    Checkout(String),
    CherryPick(String),
    Amend(String),
    Push { remote: String, branch: String },
    DeleteBranch(String),
    MoveBranch { branch: String, target: String },
    CheckoutBlocking(String),
    ResetBranch { branch: String, sha: String },
    DeleteBranchBlocking(String),
    AbortCherryPick,
}

/// Operation that can be made to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    CherryPick(String),
    Push(String),
    MoveBranch,
    CheckoutBlocking,
}

pub struct MockGitService {
    branches: Mutex<BTreeSet<String>>,
    head: Mutex<String>,
    calls: Mutex<Vec<GitCall>>,
    fail_on: Mutex<Option<FailOn>>,
    interrupt_on: Mutex<Option<String>>,
    interrupt_on_move: Mutex<bool>,
    uncommitted_changes: Mutex<bool>,
    interrupt: Arc<Notify>,
}

impl MockGitService {
    /// Repository with `branch` checked out
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branches: Mutex::new(BTreeSet::from([branch.to_string()])),
            head: Mutex::new(branch.to_string()),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            interrupt_on: Mutex::new(None),
            interrupt_on_move: Mutex::new(false),
            uncommitted_changes: Mutex::new(false),
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// Add an existing local branch
    pub fn with_branch(self, branch: &str) -> Self {
        self.branches.lock().unwrap().insert(branch.to_string());
        self
    }

    /// Make an operation fail
    pub fn fail_on(&self, op: FailOn) {
        *self.fail_on.lock().unwrap() = Some(op);
    }

    /// Fire the interrupt and hang when `sha` is cherry-picked
    pub fn interrupt_on_cherry_pick(&self, sha: &str) {
        *self.interrupt_on.lock().unwrap() = Some(sha.to_string());
    }

    /// Fire the interrupt and hang while the original branch is moved
    pub fn interrupt_on_move_branch(&self) {
        *self.interrupt_on_move.lock().unwrap() = true;
    }

    /// Report edited tracked files in the working tree
    pub fn with_uncommitted_changes(self) -> Self {
        *self.uncommitted_changes.lock().unwrap() = true;
        self
    }

    /// Future that completes when the interrupt fires
    pub fn interrupt_signal(&self) -> impl Future<Output = ()> + use<> {
        let notify = Arc::clone(&self.interrupt);
        async move { notify.notified().await }
    }

    /// Every call, in order
    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Shas that were cherry-picked, in order
    pub fn cherry_picks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::CherryPick(sha) => Some(sha),
                _ => None,
            })
            .collect()
    }

    /// Branches that were pushed, in order
    pub fn pushes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::Push { branch, .. } => Some(branch),
                _ => None,
            })
            .collect()
    }

    /// Messages passed to `amend_message`, in order
    pub fn amends(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::Amend(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Local branches that currently exist
    pub fn branches(&self) -> Vec<String> {
        self.branches.lock().unwrap().iter().cloned().collect()
    }

    /// Checked-out branch
    pub fn head(&self) -> String {
        self.head.lock().unwrap().clone()
    }

    fn record(&self, call: GitCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn should_fail(&self, op: &FailOn) -> bool {
        self.fail_on.lock().unwrap().as_ref() == Some(op)
    }

    fn failure(command: &str) -> Error {
        Error::GitCommand {
            command: format!("git {command}"),
            output: "injected failure".to_string(),
        }
    }

    fn switch_to(&self, branch: &str) -> Result<()> {
        if !self.branches.lock().unwrap().contains(branch) {
            return Err(Error::GitCommand {
                command: format!("git checkout {branch}"),
                output: format!("pathspec '{branch}' did not match"),
            });
        }
        *self.head.lock().unwrap() = branch.to_string();
        Ok(())
    }

    fn remove_branch(&self, branch: &str) -> Result<()> {
        if *self.head.lock().unwrap() == branch {
            return Err(Error::GitCommand {
                command: format!("git branch -D {branch}"),
                output: "cannot delete the checked-out branch".to_string(),
            });
        }
        if !self.branches.lock().unwrap().remove(branch) {
            return Err(Error::GitCommand {
                command: format!("git branch -D {branch}"),
                output: format!("branch '{branch}' not found"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitService for MockGitService {
    async fn checkout_new_branch(&self, branch: &str, start_point: &str) -> Result<()> {
        self.record(GitCall::CheckoutNewBranch {
            branch: branch.to_string(),
            start: start_point.to_string(),
        });
        if !self.branches.lock().unwrap().insert(branch.to_string()) {
            return Err(Error::GitCommand {
                command: format!("git checkout -b {branch}"),
                output: format!("branch '{branch}' already exists"),
            });
        }
        *self.head.lock().unwrap() = branch.to_string();
        Ok(())
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.record(GitCall::Checkout(branch.to_string()));
        self.switch_to(branch)
    }

    async fn cherry_pick(&self, sha: &str, _verify: bool) -> Result<()> {
        self.record(GitCall::CherryPick(sha.to_string()));

        let hang = self.interrupt_on.lock().unwrap().as_deref() == Some(sha);
        if hang {
            self.interrupt.notify_one();
            std::future::pending::<()>().await;
        }

        if self.should_fail(&FailOn::CherryPick(sha.to_string())) {
            return Err(Self::failure("cherry-pick"));
        }
        Ok(())
    }

    async fn amend_message(&self, message: &str) -> Result<()> {
        self.record(GitCall::Amend(message.to_string()));
        Ok(())
    }

    async fn push_force(&self, remote: &str, branch: &str, _verify: bool) -> Result<()> {
        self.record(GitCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        if self.should_fail(&FailOn::Push(branch.to_string())) {
            return Err(Self::failure("push"));
        }
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.record(GitCall::DeleteBranch(branch.to_string()));
        self.remove_branch(branch)
    }

    async fn move_branch(&self, branch: &str, target: &str) -> Result<()> {
        self.record(GitCall::MoveBranch {
            branch: branch.to_string(),
            target: target.to_string(),
        });
        if *self.interrupt_on_move.lock().unwrap() {
            self.interrupt.notify_one();
            std::future::pending::<()>().await;
        }
        if self.should_fail(&FailOn::MoveBranch) {
            return Err(Self::failure("branch -f"));
        }
        Ok(())
    }

    // Read-only, so not recorded
    async fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(*self.uncommitted_changes.lock().unwrap())
    }

    fn checkout_blocking(&self, branch: &str) -> Result<()> {
        self.record(GitCall::CheckoutBlocking(branch.to_string()));
        if self.should_fail(&FailOn::CheckoutBlocking) {
            return Err(Self::failure("checkout"));
        }
        self.switch_to(branch)
    }

    fn reset_branch_blocking(&self, branch: &str, sha: &str) -> Result<()> {
        self.record(GitCall::ResetBranch {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        if !self.branches.lock().unwrap().contains(branch) {
            return Err(Error::GitCommand {
                command: format!("git update-ref refs/heads/{branch} {sha}"),
                output: format!("branch '{branch}' not found"),
            });
        }
        Ok(())
    }

    fn delete_branch_blocking(&self, branch: &str) -> Result<()> {
        self.record(GitCall::DeleteBranchBlocking(branch.to_string()));
        self.remove_branch(branch)
    }

    fn abort_cherry_pick_blocking(&self) -> Result<()> {
        self.record(GitCall::AbortCherryPick);
        Ok(())
    }
}
