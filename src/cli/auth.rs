//! Auth command - test and explain authentication

use crate::cli::style::{Stylize, check};
use anstream::println;
use git_stack::auth::{get_github_auth, get_gitlab_auth, test_github_auth, test_gitlab_auth};
use git_stack::error::Result;
use git_stack::types::Platform;
use std::env;

/// What to do for a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Resolve a token and call the API with it
    Test,
    /// Print setup instructions
    Setup,
}

/// Run an auth subcommand
pub async fn run_auth(platform: Platform, action: AuthAction, host: Option<&str>) -> Result<()> {
    match action {
        AuthAction::Test => run_auth_test(platform, host).await,
        AuthAction::Setup => {
            print_setup(platform);
            Ok(())
        }
    }
}

async fn run_auth_test(platform: Platform, host: Option<&str>) -> Result<()> {
    match platform {
        Platform::GitHub => {
            println!("{}", "Testing GitHub authentication...".muted());
            let host = host.map(String::from).or_else(|| env::var("GH_HOST").ok());
            let config = get_github_auth(host.as_deref()).await?;
            let username = test_github_auth(&config).await?;
            println!("{} Authenticated as {}", check(), username.accent());
            println!("  Token source: {:?}", config.source);
            println!(
                "  Host: {}",
                config.host.as_deref().unwrap_or("github.com")
            );
        }
        Platform::GitLab => {
            println!("{}", "Testing GitLab authentication...".muted());
            let config = get_gitlab_auth(host).await?;
            let username = test_gitlab_auth(&config).await?;
            println!("{} Authenticated as {}", check(), username.accent());
            println!("  Token source: {:?}", config.source);
            println!("  Host: {}", config.host);
        }
    }
    Ok(())
}

fn print_setup(platform: Platform) {
    let (name, cli, url, vars, host_hint) = match platform {
        Platform::GitHub => (
            "GitHub",
            "gh",
            "https://cli.github.com/",
            "GITHUB_TOKEN or GH_TOKEN",
            "For GitHub Enterprise, pass --host or set GH_HOST",
        ),
        Platform::GitLab => (
            "GitLab",
            "glab",
            "https://gitlab.com/gitlab-org/cli",
            "GITLAB_TOKEN or GL_TOKEN",
            "For self-hosted GitLab, pass --host or set GITLAB_HOST",
        ),
    };

    println!("{}", format!("{name} Authentication Setup").emphasis());
    println!();
    println!("Option 1: {name} CLI (recommended)");
    println!("  Install: {url}");
    println!("  Run: {cli} auth login");
    println!();
    println!("Option 2: Environment variable");
    println!("  Set {vars}");
    println!();
    println!("{}", host_hint.muted());
}
