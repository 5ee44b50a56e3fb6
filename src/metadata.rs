//! Group id marker embedded in commit messages
//!
//! The marker is a trailer line at the end of the message:
//!
//! ```text
//! Add request parser
//!
//! git-stack-id: feat-parser
//! ```
//!
//! Group ids are branch names, so they never contain whitespace.

use regex::Regex;
use std::sync::OnceLock;

/// Trailer key for the group id marker
pub const MARKER_KEY: &str = "git-stack-id";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^git-stack-id:[ \t]*(\S+)[ \t]*\r?$")
            .expect("hardcoded marker regex is valid")
    })
}

/// Decode the group id from a commit message
///
/// When several markers are present the last one wins.
pub fn decode(message: &str) -> Option<String> {
    marker_regex()
        .captures_iter(message)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Stamp a commit message with a group id, replacing any existing marker
pub fn encode(message: &str, group_id: &str) -> String {
    let stripped = remove(message);
    if stripped.is_empty() {
        format!("{MARKER_KEY}: {group_id}")
    } else {
        format!("{stripped}\n\n{MARKER_KEY}: {group_id}")
    }
}

/// Strip every group id marker from a commit message
pub fn remove(message: &str) -> String {
    let kept: Vec<&str> = message
        .lines()
        .filter(|line| !marker_regex().is_match(line))
        .collect();
    kept.join("\n").trim_end().to_string()
}
