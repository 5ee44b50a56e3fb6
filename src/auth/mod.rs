//! Authentication for GitHub and GitLab
//!
//! Tokens come from the platform CLI (`gh`, `glab`) first, then from
//! environment variables.

mod github;
mod gitlab;

pub use github::{GitHubAuthConfig, get_github_auth, test_github_auth};
pub use gitlab::{GitLabAuthConfig, get_gitlab_auth, test_gitlab_auth};

use tokio::process::Command;

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh or glab)
    Cli,
    /// Token from environment variable
    EnvVar,
}

/// Ask a platform CLI for its stored token
///
/// Returns `None` when the program is missing, not logged in, or prints
/// nothing.
async fn cli_token(program: &str, host_flag: Option<(&str, &str)>) -> Option<String> {
    let mut status = Command::new(program);
    status.args(["auth", "status"]);
    let mut token = Command::new(program);
    token.args(["auth", "token"]);
    if let Some((flag, host)) = host_flag {
        status.args([flag, host]);
        token.args([flag, host]);
    }

    let status = status.output().await.ok()?;
    if !status.status.success() {
        return None;
    }

    let output = token.output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    non_empty(&String::from_utf8_lossy(&output.stdout))
}

/// First non-empty value among `names`, looked up through `lookup`
fn first_env<F>(names: &[&str], lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names.iter().find_map(|name| lookup(name).and_then(|v| non_empty(&v)))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
