//! git-stack - stacked pull requests from a single branch
//!
//! CLI binary: shows the stack, optionally lets you regroup commits, then
//! replays dirty groups and publishes one PR per group.

use anstream::eprintln;
use anyhow::Result;
use clap::{Parser, Subcommand};
use git_stack::config::ConfigLayer;
use git_stack::error::{EXIT_FAILURE, Error};
use git_stack::types::Platform;
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::style::{Stylize, cross};

#[derive(Parser)]
#[command(name = "git-stack")]
#[command(about = "Stacked PRs from a single branch - GitHub & GitLab")]
#[command(version)]
struct Cli {
    /// Path to the git repository (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Show the stack status and exit
    #[arg(long)]
    check: bool,

    /// Replay and push every group, even when nothing changed
    #[arg(long)]
    force: bool,

    /// Skip git hooks on cherry-pick and push
    #[arg(long)]
    no_verify: bool,

    /// Replay locally without pushing or touching PRs
    #[arg(long)]
    no_sync: bool,

    /// Interactively assign commits to groups before syncing
    #[arg(long)]
    select: bool,

    /// Git remote to push to
    #[arg(long)]
    remote: Option<String>,

    /// Trunk branch the stack is based on
    #[arg(long)]
    trunk: Option<String>,

    /// Verbose output and debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    /// Flags that override config file keys
    fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            remote: self.remote.clone(),
            trunk: self.trunk.clone(),
            verify: self.no_verify.then_some(false),
            sync: self.no_sync.then_some(false),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication management
    Auth {
        #[command(subcommand)]
        platform: AuthPlatform,
    },
}

#[derive(Subcommand)]
enum AuthPlatform {
    /// GitHub authentication
    Github {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// GitLab authentication
    Gitlab {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Test authentication
    Test {
        /// Self-hosted instance hostname
        #[arg(long)]
        host: Option<String>,
    },
    /// Show authentication setup instructions
    Setup,
}

impl AuthAction {
    fn split(self) -> (cli::AuthAction, Option<String>) {
        match self {
            Self::Test { host } => (cli::AuthAction::Test, host),
            Self::Setup => (cli::AuthAction::Setup, None),
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let overrides = cli.config_layer();
    let options = cli::RunOptions {
        check: cli.check,
        force: cli.force,
        select: cli.select,
        debug: cli.debug,
    };

    match cli.command {
        None => cli::run_stack(&path, overrides, options).await?,
        Some(Commands::Auth { platform }) => {
            let (platform, action) = match platform {
                AuthPlatform::Github { action } => (Platform::GitHub, action),
                AuthPlatform::Gitlab { action } => (Platform::GitLab, action),
            };
            let (action, host) = action.split();
            cli::run_auth(platform, action, host.as_deref()).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::logging::init(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", cross(), err.error());
            let stack_err = err.downcast_ref::<Error>();
            if stack_err.is_some_and(Error::is_external) {
                eprintln!(
                    "{}",
                    "Rerun with --debug to see every git and API call"
                        .muted()
                        .for_stderr()
                );
            }
            let code = stack_err.map_or(EXIT_FAILURE, Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
