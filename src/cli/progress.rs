//! CLI progress callback with styled output

use crate::cli::style::{Stream, Stylize, arrow, check, cross, hyperlink_url};
use anstream::{eprintln, print, println};
use async_trait::async_trait;
use git_stack::error::Error;
use git_stack::sync::{Phase, ProgressCallback, PushStatus, RestoreReport};
use git_stack::types::{Group, PullRequest};
use std::io::Write;

/// Prints sync progress to the terminal
pub struct CliProgress {
    /// Also print phase transitions and skipped work
    pub verbose: bool,
}

impl CliProgress {
    /// Create progress output; `verbose` follows `--debug`
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::UpdatingBodies => println!("  {}", "Updating stack tables...".muted()),
            Phase::Complete => println!("{} {}", check(), "Stack synced".success()),
            Phase::Rebasing | Phase::Finalizing if self.verbose => {
                println!("  {}", format!("{phase:?}...").muted());
            }
            _ => {}
        }
    }

    async fn on_group(&self, index: usize, total: usize, group: &Group) {
        let position = format!("({}/{total})", index + 1);
        if group.is_unassigned() {
            println!(
                "{} {} {}",
                arrow(),
                position.muted(),
                "Unassigned commits".emphasis()
            );
        } else {
            println!(
                "{} {} {} {}",
                arrow(),
                position.muted(),
                group.id.accent(),
                group.title.muted()
            );
        }
    }

    async fn on_push(&self, group_id: &str, status: PushStatus) {
        match status {
            PushStatus::Started => {
                print!("    Pushing {}... ", group_id.accent());
                let _ = std::io::stdout().flush();
            }
            PushStatus::Success => println!("{}", "done".success()),
            PushStatus::Failed(msg) => println!("{}", msg.warn().for_stdout()),
        }
    }

    async fn on_pr_created(&self, group_id: &str, pr: &PullRequest) {
        println!(
            "    Created PR {} for {} ({})",
            format!("#{}", pr.number).accent(),
            group_id.accent(),
            hyperlink_url(Stream::Stdout, &pr.url)
        );
    }

    async fn on_pr_updated(&self, group_id: &str, pr: &PullRequest) {
        println!(
            "    Updated PR {} for {}",
            format!("#{}", pr.number).accent(),
            group_id.accent()
        );
    }

    async fn on_error(&self, err: &Error) {
        eprintln!("    {}: {}", "warning".warn(), err);
    }

    async fn on_message(&self, message: &str) {
        println!("  {}", message.muted());
    }

    fn on_restore(&self, report: &RestoreReport) {
        if report.restored {
            eprintln!(
                "{} Restored {}",
                cross(),
                report.original_branch.emphasis().for_stderr()
            );
        } else {
            eprintln!(
                "{} Could not check out {}; run `git checkout {}`",
                cross(),
                report.original_branch.warn(),
                report.original_branch
            );
        }
        for failure in &report.failures {
            eprintln!("    {}", failure.muted().for_stderr());
        }
    }
}
