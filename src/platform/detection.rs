//! Platform detection from remote URLs

use crate::error::{Error, Result};
use crate::types::{GitRemote, Platform, PlatformConfig};
use regex::Regex;
use std::env;
use std::sync::OnceLock;

fn ssh_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:ssh://)?[^@/]+@[^:/]+(?::\d+)?[:/](.+?)(?:\.git)?/?$")
            .unwrap_or_else(|e| panic!("invalid ssh remote pattern: {e}"))
    })
}

fn https_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[^/]+/(.+?)(?:\.git)?/?$")
            .unwrap_or_else(|e| panic!("invalid https remote pattern: {e}"))
    })
}

/// Detect platform (GitHub or GitLab) from a remote URL
///
/// Self-hosted instances are recognized through `GH_HOST` and `GITLAB_HOST`.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let hostname = extract_hostname(url)?;
    platform_for_host(
        &hostname,
        env::var("GH_HOST").ok().as_deref(),
        env::var("GITLAB_HOST").ok().as_deref(),
    )
}

fn platform_for_host(
    hostname: &str,
    gh_host: Option<&str>,
    gitlab_host: Option<&str>,
) -> Option<Platform> {
    if hostname == "github.com" || hostname.ends_with(".github.com") || gh_host == Some(hostname)
    {
        return Some(Platform::GitHub);
    }

    if hostname == "gitlab.com" || hostname.ends_with(".gitlab.com") || gitlab_host == Some(hostname)
    {
        return Some(Platform::GitLab);
    }

    None
}

/// Parse repository info (owner/repo) from a remote URL
pub fn parse_repo_info(url: &str) -> Result<PlatformConfig> {
    let platform = detect_platform(url).ok_or(Error::NoSupportedRemotes)?;
    let hostname = extract_hostname(url);

    let path = https_path_re()
        .captures(url)
        .or_else(|| ssh_path_re().captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Parse(format!("cannot parse remote URL: {url}")))?;

    // GitLab allows nested groups: everything but the last segment is the owner
    let Some((owner, repo)) = path.rsplit_once('/') else {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    };
    if owner.is_empty() || repo.is_empty() {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    }

    let public_host = match platform {
        Platform::GitHub => "github.com",
        Platform::GitLab => "gitlab.com",
    };
    let host = hostname.filter(|h| h != public_host);

    Ok(PlatformConfig {
        platform,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}

/// Pick the remote to publish to
///
/// An explicitly requested remote must exist. Otherwise `origin` wins when
/// it points at a supported platform, then the first supported remote.
pub fn select_remote<'a>(remotes: &'a [GitRemote], requested: Option<&str>) -> Result<&'a GitRemote> {
    if let Some(name) = requested {
        return remotes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::RemoteNotFound(name.to_string()));
    }

    let supported: Vec<&GitRemote> = remotes
        .iter()
        .filter(|r| detect_platform(&r.url).is_some())
        .collect();

    supported
        .iter()
        .find(|r| r.name == "origin")
        .or_else(|| supported.first())
        .copied()
        .ok_or(Error::NoSupportedRemotes)
}

fn extract_hostname(url: &str) -> Option<String> {
    // scp-like syntax: user@host:path
    if !url.contains("://") {
        let (_, rest) = url.split_once('@')?;
        return rest.split(':').next().map(ToString::to_string);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
}
