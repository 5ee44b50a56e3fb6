//! Default command - show the stack and sync it

use crate::cli::context::CommandContext;
use crate::cli::progress::CliProgress;
use crate::cli::select::select_range;
use crate::cli::status::print_status;
use crate::cli::style::{Stylize, check};
use anstream::println;
use git_stack::config::ConfigLayer;
use git_stack::editor::RangeEditor;
use git_stack::error::Result;
use git_stack::range::{RangeInput, build_range};
use git_stack::sync::{
    SyncContext, SyncOptions, SyncOutcome, create_sync_plan, execute_sync,
};
use std::path::Path;
use tracing::debug;

/// Flags of the default command that are not config keys
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print the status table and stop
    pub check: bool,
    /// Replay every group even when nothing is dirty
    pub force: bool,
    /// Open the range editor before syncing
    pub select: bool,
    /// Verbose output
    pub debug: bool,
}

/// Completes on the first Ctrl-C; never completes if the handler cannot be installed
async fn interrupt() {
    if tokio::signal::ctrl_c().await.is_err() {
        debug!("could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run the default command
pub async fn run_stack(path: &Path, overrides: ConfigLayer, options: RunOptions) -> Result<()> {
    let ctx = CommandContext::new(path, overrides).await?;

    if ctx.commits.is_empty() {
        println!(
            "{}",
            format!("No commits between {} and {}", ctx.trunk, ctx.branch).muted()
        );
        return Ok(());
    }

    let mut assignment = ctx.assignment();
    let mut range = build_range(&RangeInput {
        commits: &ctx.commits,
        assignment: &assignment,
        pull_requests: &ctx.pull_requests,
        trunk: &ctx.trunk,
    })?;

    print_status(&range);

    if options.check {
        return Ok(());
    }

    if options.select {
        let editor = RangeEditor::new(
            ctx.commits.clone(),
            assignment,
            ctx.pull_requests.clone(),
            ctx.trunk.as_str(),
        )?;
        let Some((selected, edited)) = select_range(editor)? else {
            println!("{}", "Aborted".muted());
            return Ok(());
        };
        assignment = selected;
        range = edited;
        print_status(&range);
    }

    if range.is_synced() && !options.force {
        println!("{} {}", check(), "Everything up to date".success());
        println!("{}", "Run with --force to replay and push anyway".muted());
        return Ok(());
    }

    let sync_ctx = SyncContext::new(
        range,
        ctx.branch.as_str(),
        ctx.merge_base.as_str(),
        assignment,
        ctx.remote_name.as_str(),
    )?;
    let plan = create_sync_plan(
        &sync_ctx,
        SyncOptions {
            publish: ctx.config.sync,
            verify: ctx.config.verify,
            force: options.force,
        },
    );

    let progress = CliProgress::new(options.debug);
    let result = execute_sync(
        &plan,
        &sync_ctx,
        &ctx.git,
        ctx.platform.as_ref(),
        &progress,
        interrupt(),
    )
    .await?;

    if result.outcome == SyncOutcome::Synced {
        println!();
        println!(
            "{}",
            format!(
                "{} rebased, {} pushed, {} created, {} updated",
                result.rebased_groups.len(),
                result.pushed.len(),
                result.created_prs.len(),
                result.updated_prs.len()
            )
            .muted()
        );
        if !ctx.config.sync {
            println!("{}", "Publishing skipped (--no-sync)".muted());
        }
    }

    Ok(())
}
