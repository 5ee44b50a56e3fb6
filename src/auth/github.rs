//! GitHub authentication

use crate::auth::{AuthSource, cli_token, first_env};
use crate::error::{Error, Result};
use std::env;

/// Token environment variables, in priority order
const TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
    /// Enterprise host, `None` for github.com
    pub host: Option<String>,
}

/// Get GitHub authentication
///
/// Priority:
/// 1. gh CLI (`gh auth token`)
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    let host = host.map(String::from);

    let host_flag = host.as_deref().map(|h| ("--hostname", h));
    if let Some(token) = cli_token("gh", host_flag).await {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
            host,
        });
    }

    if let Some(token) = first_env(TOKEN_VARS, |k| env::var(k).ok()) {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host,
        });
    }

    Err(Error::Auth(
        "No GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
    ))
}

/// Test GitHub authentication, returning the login name
pub async fn test_github_auth(config: &GitHubAuthConfig) -> Result<String> {
    let mut builder = octocrab::Octocrab::builder().personal_token(config.token.clone());
    if let Some(ref h) = config.host {
        builder = builder
            .base_uri(format!("https://{h}/api/v3"))
            .map_err(|e| Error::GitHubApi(e.to_string()))?;
    }
    let octocrab = builder
        .build()
        .map_err(|e| Error::GitHubApi(e.to_string()))?;

    let user = octocrab
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("Invalid token: {e}")))?;

    Ok(user.login)
}
