//! git-stack - stacked pull requests from a single branch
//!
//! Each commit between the merge-base and `HEAD` belongs to a named group.
//! Every group becomes one remote branch and one pull request, and each pull
//! request targets the branch of the group below it.
//!
//! The library is split along the pipeline:
//! - [`metadata`]: group id marker embedded in commit messages
//! - [`range`]: derive the ordered, dirty-flagged group list
//! - [`summary`]: stack table embedded in every pull request body
//! - [`sync`]: replay dirty groups and publish them, with rollback
//! - [`editor`]: reassign commits between groups before syncing

pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod git;
pub mod metadata;
pub mod platform;
pub mod range;
pub mod summary;
pub mod sync;
pub mod types;
