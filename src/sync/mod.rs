//! Stack synchronization engine
//!
//! Handles replaying a stack of groups and publishing it:
//! 1. Planning - find the first dirty group and where to replay it from
//! 2. Execution - cherry-pick, push, create/update PRs, repair stack tables
//! 3. Finalize - move the original branch onto the replayed commits
//!
//! Any failure or interrupt after the working branch exists restores the
//! original branch through the blocking rollback path.

mod execute;
mod plan;
mod progress;
mod rollback;

pub use execute::{SyncOutcome, SyncResult, execute_sync};
pub use plan::{SyncContext, SyncOptions, SyncPlan, create_sync_plan, working_branch_name};
pub use progress::{NoopProgress, Phase, ProgressCallback, PushStatus};
pub use rollback::{RestoreReport, restore};
