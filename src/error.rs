//! Error types for git-stack

use thiserror::Error;

/// Process exit status when a run was rolled back and the branch restored
pub const EXIT_RESTORED: i32 = 5;

/// Process exit status for any other failure
pub const EXIT_FAILURE: i32 = 1;

/// Errors produced by the sync engine and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Required run context missing before any mutation happened
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Commit history or assignment cannot be turned into a range
    #[error("invalid commit range: {0}")]
    InvalidRange(String),

    /// An assignment would split a group into non-adjacent runs
    #[error("group '{0}' would no longer be a contiguous run of commits")]
    NonContiguousGroup(String),

    /// A git command exited unsuccessfully
    #[error("`{command}` failed: {output}")]
    GitCommand {
        /// The command line that was run
        command: String,
        /// Captured stderr (or stdout when stderr was empty)
        output: String,
    },

    /// Generic hosting platform failure
    #[error("platform error: {0}")]
    Platform(String),

    /// GitHub API failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API failure
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// The run was cancelled by the user and the repository restored
    #[error("interrupted, original branch restored")]
    Interrupted,

    /// The run failed after mutating the repository and was rolled back
    #[error("{0} (original branch restored)")]
    Restored(#[source] Box<Error>),

    /// Authentication could not be resolved
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Unparseable input (remote URLs, command output)
    #[error("parse error: {0}")]
    Parse(String),

    /// No GitHub or GitLab remote is configured
    #[error("no supported remotes found (GitHub or GitLab)")]
    NoSupportedRemotes,

    /// Requested remote does not exist
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Interactive prompt failed
    #[error("prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected internal state
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit status for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted | Self::Restored(_) => EXIT_RESTORED,
            _ => EXIT_FAILURE,
        }
    }

    /// Whether the error came from one of the external collaborators
    pub fn is_external(&self) -> bool {
        match self {
            Self::Restored(inner) => inner.is_external(),
            _ => matches!(
                self,
                Self::GitCommand { .. }
                    | Self::Platform(_)
                    | Self::GitHubApi(_)
                    | Self::GitLabApi(_)
            ),
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::GitLabApi(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
