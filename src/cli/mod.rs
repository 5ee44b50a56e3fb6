//! CLI commands
//!
//! Command implementations for the `git-stack` binary.

mod auth;
mod context;
pub mod logging;
mod progress;
mod run;
mod select;
mod status;
pub mod style;

pub use auth::{AuthAction, run_auth};
pub use run::{RunOptions, run_stack};
