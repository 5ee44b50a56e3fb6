//! Stack summary table embedded in pull request bodies
//!
//! Every PR in a stack carries the same list of PR URLs, with its own row
//! highlighted. The block is fenced by hidden markers so it can be found and
//! replaced wholesale on later syncs without touching the rest of the body.

use std::fmt::Write;

/// Start of the generated block
pub const TABLE_START: &str = "<!--- GIT-STACK_TABLE_START --->";

/// End of the generated block
pub const TABLE_END: &str = "<!--- GIT-STACK_TABLE_END --->";

/// Marker appended to the row of the PR being rendered
pub const STACK_TABLE_THIS_PR: &str = "👈";

const TABLE_HEADING: &str = "#### Stack";

/// Render the stack table into `body`
///
/// An existing table is replaced in place; otherwise the table is appended
/// after the body, separated by a blank line. `pr_url_list` is in stack
/// order and may contain placeholder ids for groups that have no PR yet.
pub fn write(body: &str, pr_url_list: &[String], selected_url: &str) -> String {
    let table = render_table(pr_url_list, selected_url);

    if let Some((start, end)) = find_table(body) {
        let mut result = String::with_capacity(body.len() + table.len());
        result.push_str(&body[..start]);
        result.push_str(&table);
        result.push_str(&body[end..]);
        return result;
    }

    let trimmed = body.trim_end();
    if trimmed.is_empty() {
        table
    } else {
        format!("{trimmed}\n\n{table}")
    }
}

/// Whether rendering would leave `body` unchanged
pub fn is_unchanged(body: &str, pr_url_list: &[String], selected_url: &str) -> bool {
    write(body, pr_url_list, selected_url) == body
}

/// Byte span of an existing table block, end marker included
///
/// A start marker without an end marker is a truncated table that runs to
/// the end of the body.
fn find_table(body: &str) -> Option<(usize, usize)> {
    let start = body.find(TABLE_START)?;
    let end = body[start..]
        .find(TABLE_END)
        .map_or(body.len(), |offset| start + offset + TABLE_END.len());
    Some((start, end))
}

fn render_table(pr_url_list: &[String], selected_url: &str) -> String {
    let mut table = String::new();
    let _ = writeln!(table, "{TABLE_START}");
    let _ = writeln!(table, "{TABLE_HEADING}");
    let _ = writeln!(table);
    for url in pr_url_list {
        if url == selected_url {
            let _ = writeln!(table, "* **{url} {STACK_TABLE_THIS_PR}**");
        } else {
            let _ = writeln!(table, "* {url}");
        }
    }
    let _ = write!(table, "{TABLE_END}");
    table
}
