//! Git collaborator
//!
//! [`GitService`] is the version-control surface the sync engine drives.
//! Normal operations are async and awaited one at a time. Rollback uses the
//! separate blocking methods: an interrupt is delivered to every child of the
//! process group, so cleanup must not depend on the async call path that the
//! same interrupt may have cut short.

use crate::error::{Error, Result};
use crate::types::{Commit, GitRemote};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tracing::{debug, instrument, warn};

/// Record separator used when parsing `git log`
const RECORD_SEP: char = '\u{1e}';

/// Field separator used when parsing `git log`
const FIELD_SEP: char = '\u{1f}';

/// Config override that disables every hook for one command
const NO_HOOKS: &str = "core.hooksPath=/dev/null";

/// Version-control operations used by the sync engine
#[async_trait]
pub trait GitService: Send + Sync {
    /// Create a branch at `start_point` and check it out
    async fn checkout_new_branch(&self, branch: &str, start_point: &str) -> Result<()>;

    /// Check out an existing branch
    async fn checkout(&self, branch: &str) -> Result<()>;

    /// Cherry-pick a commit onto `HEAD`
    async fn cherry_pick(&self, sha: &str, verify: bool) -> Result<()>;

    /// Replace the message of the `HEAD` commit
    async fn amend_message(&self, message: &str) -> Result<()>;

    /// Force-push `HEAD` to `branch` on `remote`
    async fn push_force(&self, remote: &str, branch: &str, verify: bool) -> Result<()>;

    /// Force-delete a local branch
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Point `branch` at `target`
    async fn move_branch(&self, branch: &str, target: &str) -> Result<()>;

    /// Whether tracked files differ from `HEAD`
    async fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Check out a branch without going through the async path
    ///
    /// Never forced: local edits that would be overwritten make it fail.
    fn checkout_blocking(&self, branch: &str) -> Result<()>;

    /// Point `branch` at `sha` without touching the working tree
    fn reset_branch_blocking(&self, branch: &str, sha: &str) -> Result<()>;

    /// Force-delete a local branch without going through the async path
    fn delete_branch_blocking(&self, branch: &str) -> Result<()>;

    /// Abort an in-progress cherry-pick, if any
    fn abort_cherry_pick_blocking(&self) -> Result<()>;
}

/// [`GitService`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        let candidate = Self {
            workdir: path.to_path_buf(),
        };
        let root = candidate.run_blocking(&["rev-parse", "--show-toplevel"])?;
        Ok(Self {
            workdir: PathBuf::from(root.trim()),
        })
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.workdir
    }

    /// Name of the checked-out branch (errors on detached `HEAD`)
    pub fn current_branch(&self) -> Result<String> {
        let name = self.run_blocking(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = name.trim().to_string();
        if name == "HEAD" {
            return Err(Error::Precondition(
                "HEAD is detached; check out a branch first".to_string(),
            ));
        }
        Ok(name)
    }

    /// Full sha of a revision
    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        Ok(self
            .run_blocking(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])?
            .trim()
            .to_string())
    }

    /// Full sha of `HEAD`
    pub fn head_sha(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    /// Common ancestor of `HEAD` and `upstream`
    pub fn merge_base(&self, upstream: &str) -> Result<String> {
        Ok(self
            .run_blocking(&["merge-base", "HEAD", upstream])?
            .trim()
            .to_string())
    }

    /// Default branch advertised by `remote`, falling back to `main`
    pub fn default_trunk(&self, remote: &str) -> String {
        let symref = format!("refs/remotes/{remote}/HEAD");
        self.run_blocking(&["symbolic-ref", "--quiet", &symref])
            .ok()
            .and_then(|out| {
                out.trim()
                    .strip_prefix(&format!("refs/remotes/{remote}/"))
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| "main".to_string())
    }

    /// Commits in `base..HEAD`, oldest first
    ///
    /// Merge commits are rejected: the stack must be a single linear run.
    #[instrument(skip(self))]
    pub fn commits_between(&self, base: &str) -> Result<Vec<Commit>> {
        let range = format!("{base}..HEAD");

        let merges = self.run_blocking(&["rev-list", "--merges", &range])?;
        if !merges.trim().is_empty() {
            return Err(Error::InvalidRange(format!(
                "merge commits found in {range}; history must be linear"
            )));
        }

        let format = format!("--format=%H{FIELD_SEP}%B{RECORD_SEP}");
        let out = self.run_blocking(&["log", "--reverse", &format, &range])?;
        let commits = parse_log(&out);
        debug!(count = commits.len(), "listed commits");
        Ok(commits)
    }

    /// Configured remotes
    pub fn remotes(&self) -> Result<Vec<GitRemote>> {
        let out = self.run_blocking(&["remote", "-v"])?;
        Ok(parse_remotes(&out))
    }

    fn command_line(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    fn check(args: &[&str], output: &Output) -> Result<String> {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(Error::GitCommand {
            command: Self::command_line(args),
            output: if stderr.is_empty() {
                stdout.trim().to_string()
            } else {
                stderr
            },
        })
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(command = %Self::command_line(args), "running");
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await?;
        Self::check(args, &output)
    }

    fn run_blocking(&self, args: &[&str]) -> Result<String> {
        debug!(command = %Self::command_line(args), "running (blocking)");
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        Self::check(args, &output)
    }
}

#[async_trait]
impl GitService for GitCli {
    async fn checkout_new_branch(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch, start_point]).await?;
        Ok(())
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch]).await?;
        Ok(())
    }

    async fn cherry_pick(&self, sha: &str, verify: bool) -> Result<()> {
        // --ff keeps the original sha when its parent already matches HEAD
        let mut args = Vec::new();
        if !verify {
            args.extend(["-c", NO_HOOKS]);
        }
        args.extend(["cherry-pick", "--ff", "--keep-redundant-commits", sha]);
        self.run(&args).await?;
        Ok(())
    }

    async fn amend_message(&self, message: &str) -> Result<()> {
        self.run(&[
            "commit",
            "--amend",
            "--no-verify",
            "--allow-empty",
            "--cleanup=whitespace",
            "-m",
            message,
        ])
        .await?;
        Ok(())
    }

    async fn push_force(&self, remote: &str, branch: &str, verify: bool) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        let mut args = vec!["push", "--force", remote, refspec.as_str()];
        if !verify {
            args.push("--no-verify");
        }
        self.run(&args).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.run(&["branch", "-D", branch]).await?;
        Ok(())
    }

    async fn move_branch(&self, branch: &str, target: &str) -> Result<()> {
        self.run(&["branch", "-f", branch, target]).await?;
        Ok(())
    }

    async fn has_uncommitted_changes(&self) -> Result<bool> {
        let out = self
            .run(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(!out.trim().is_empty())
    }

    fn checkout_blocking(&self, branch: &str) -> Result<()> {
        self.run_blocking(&["checkout", branch])?;
        Ok(())
    }

    fn reset_branch_blocking(&self, branch: &str, sha: &str) -> Result<()> {
        let refname = format!("refs/heads/{branch}");
        self.run_blocking(&["update-ref", &refname, sha])?;
        Ok(())
    }

    fn delete_branch_blocking(&self, branch: &str) -> Result<()> {
        self.run_blocking(&["branch", "-D", branch])?;
        Ok(())
    }

    fn abort_cherry_pick_blocking(&self) -> Result<()> {
        if self
            .run_blocking(&["rev-parse", "--quiet", "--verify", "CHERRY_PICK_HEAD"])
            .is_err()
        {
            return Ok(());
        }
        warn!("aborting in-progress cherry-pick");
        self.run_blocking(&["cherry-pick", "--abort"])?;
        Ok(())
    }
}

/// Parse `git log` output produced with the record/field separators
fn parse_log(out: &str) -> Vec<Commit> {
    out.split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches('\n');
            let (sha, message) = record.split_once(FIELD_SEP)?;
            let sha = sha.trim();
            if sha.is_empty() {
                return None;
            }
            Some(Commit::new(sha, message.trim_end()))
        })
        .collect()
}

/// Parse `git remote -v` output, keeping one entry per remote
fn parse_remotes(out: &str) -> Vec<GitRemote> {
    let mut remotes: Vec<GitRemote> = Vec::new();
    for line in out.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if remotes.iter().any(|r| r.name == name) {
            continue;
        }
        remotes.push(GitRemote {
            name: name.to_string(),
            url: url.to_string(),
        });
    }
    remotes
}
