//! Status table: one row per group

use crate::cli::style::{BANG, CHECK, STAR, Stream, Stylize, hyperlink_url, truncate};
use anstream::println;
use git_stack::types::CommitRange;

/// Longest title shown before truncation
const MAX_TITLE_LENGTH: usize = 50;

/// Sync state of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Commits that belong to no group
    New,
    /// Local commits differ from the PR
    Outdated,
    /// PR matches local commits
    Synced,
}

impl RowStatus {
    const fn icon(self) -> &'static str {
        match self {
            Self::New => STAR,
            Self::Outdated => BANG,
            Self::Synced => CHECK,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Outdated => "OUTDATED",
            Self::Synced => "SYNCED",
        }
    }
}

/// One line of the status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Sync state
    pub status: RowStatus,
    /// `<remote commits>/<local commits>`
    pub count: String,
    /// PR title, group id, or "Unassigned"
    pub title: String,
    /// PR URL, empty without a PR
    pub url: String,
}

/// Build rows in stack order, oldest group first
pub fn status_rows(range: &CommitRange) -> Vec<StatusRow> {
    range
        .group_list
        .iter()
        .map(|group| {
            let local = group.commits.len();
            if group.is_unassigned() {
                return StatusRow {
                    status: RowStatus::New,
                    count: format!("0/{local}"),
                    title: "Unassigned".to_string(),
                    url: String::new(),
                };
            }

            let status = if group.dirty {
                RowStatus::Outdated
            } else {
                RowStatus::Synced
            };

            match &group.pull_request {
                Some(pr) => StatusRow {
                    status,
                    count: format!("{}/{local}", pr.remote_commit_count()),
                    title: pr.title.clone(),
                    url: pr.url.clone(),
                },
                None => StatusRow {
                    status,
                    count: format!("0/{local}"),
                    title: group.id.clone(),
                    url: String::new(),
                },
            }
        })
        .collect()
}

/// Lay rows out in aligned columns, without color
pub fn format_rows(rows: &[StatusRow]) -> Vec<(RowStatus, String)> {
    let width = |f: &dyn Fn(&StatusRow) -> usize| rows.iter().map(f).max().unwrap_or_default();
    let status_width = width(&|r| r.status.label().len());
    let count_width = width(&|r| r.count.len());
    let title_width = width(&|r| r.title.chars().count()).min(MAX_TITLE_LENGTH);

    rows.iter()
        .map(|row| {
            let line = format!(
                "{}  {:<status_width$}  {:<count_width$}  {:<title_width$}",
                row.status.icon(),
                row.status.label(),
                row.count,
                truncate(&row.title, MAX_TITLE_LENGTH),
            );
            (row.status, line.trim_end().to_string())
        })
        .collect()
}

/// Print the status table
pub fn print_status(range: &CommitRange) {
    let rows = status_rows(range);
    if rows.is_empty() {
        println!("{}", "No data found.".muted());
        return;
    }

    println!();
    for ((status, line), row) in format_rows(&rows).into_iter().zip(&rows) {
        let line = match status {
            RowStatus::New => line.muted().to_string(),
            RowStatus::Outdated => line.warn().for_stdout().to_string(),
            RowStatus::Synced => line.success().to_string(),
        };
        if row.url.is_empty() {
            println!("{line}");
        } else {
            println!("{line}  {}", hyperlink_url(Stream::Stdout, &row.url));
        }
    }
    println!();
}
