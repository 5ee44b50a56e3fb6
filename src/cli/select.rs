//! Terminal front end for the range editor

use crate::cli::style::{POINTER, Stylize, cross, truncate};
use anstream::{eprintln, println};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};
use git_stack::editor::RangeEditor;
use git_stack::error::{Error, Result};
use git_stack::types::{CommitAssignment, CommitRange};

const MAX_SUBJECT_LENGTH: usize = 60;

const ACTIONS: [&str; 6] = [
    "Edit commits of this group",
    "Next group",
    "Previous group",
    "New group",
    "Done",
    "Cancel",
];

fn prompt_err(e: dialoguer::Error) -> Error {
    Error::Prompt(e.to_string())
}

/// Let the user move commits between groups
///
/// Returns `None` when the user cancels.
pub fn select_range(mut editor: RangeEditor) -> Result<Option<(CommitAssignment, CommitRange)>> {
    let theme = ColorfulTheme::default();

    if editor.group_ids().is_empty() {
        println!("{}", "No groups yet; create one first.".muted());
        if !add_group(&mut editor, &theme)? {
            return Ok(None);
        }
    }

    loop {
        print_header(&editor);

        let action = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&ACTIONS[..])
            .default(0)
            .interact_opt()
            .map_err(prompt_err)?;

        match action {
            Some(0) => edit_commits(&mut editor, &theme)?,
            Some(1) => editor.next_group(),
            Some(2) => editor.prev_group(),
            Some(3) => {
                add_group(&mut editor, &theme)?;
            }
            Some(4) => return Ok(Some(editor.finish())),
            _ => return Ok(None),
        }
    }
}

fn print_header(editor: &RangeEditor) {
    let (index, total) = editor.position();
    let id = editor.current_group().unwrap_or_default();
    let title = editor.current_title().unwrap_or_default();
    println!();
    println!(
        "{} {} {} {}",
        POINTER.accent(),
        format!("({}/{total})", index + 1).muted(),
        id.accent(),
        title.emphasis()
    );
}

/// Prompt for a new group id; returns whether one was added
fn add_group(editor: &mut RangeEditor, theme: &ColorfulTheme) -> Result<bool> {
    let id: String = Input::with_theme(theme)
        .with_prompt("Group id (branch name)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let id = id.trim();
    if id.is_empty() {
        return Ok(false);
    }

    match editor.add_group(id) {
        Ok(()) => Ok(true),
        Err(e) => {
            eprintln!("{} {e}", cross());
            Ok(false)
        }
    }
}

/// Check or uncheck commits for the current group
///
/// Commits owned by other groups are listed but cannot be changed.
fn edit_commits(editor: &mut RangeEditor, theme: &ColorfulTheme) -> Result<()> {
    let Some(current) = editor.current_group().map(ToString::to_string) else {
        return Ok(());
    };

    let items = editor.items();
    let labels: Vec<String> = items
        .iter()
        .map(|item| {
            let subject = truncate(item.commit.subject(), MAX_SUBJECT_LENGTH);
            match item.group_id {
                Some(owner) if item.disabled => {
                    format!("{} {subject} [{owner}]", item.commit.short_sha())
                }
                _ => format!("{} {subject}", item.commit.short_sha()),
            }
        })
        .collect();
    let checked: Vec<bool> = items
        .iter()
        .map(|item| item.group_id == Some(current.as_str()))
        .collect();
    let locked: Vec<bool> = items.iter().map(|item| item.disabled).collect();
    let shas: Vec<String> = items.iter().map(|item| item.commit.sha.clone()).collect();

    let Some(chosen) = MultiSelect::with_theme(theme)
        .with_prompt(format!("Commits in {current} (newest first)"))
        .items(&labels)
        .defaults(&checked)
        .interact_opt()
        .map_err(prompt_err)?
    else {
        return Ok(());
    };

    for (i, sha) in shas.iter().enumerate() {
        if locked[i] || chosen.contains(&i) == checked[i] {
            continue;
        }
        if let Err(e) = editor.toggle(sha) {
            eprintln!("{} {e}", cross());
        }
    }
    Ok(())
}
