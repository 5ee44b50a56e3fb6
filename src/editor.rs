//! Interactive range editor state
//!
//! Holds the commit to group assignment while the user moves commits
//! between groups. Every mutation re-derives the range through
//! [`build_range`], so the orchestrator always receives a consistent
//! [`CommitRange`]. The terminal front end lives in the binary; this type
//! only models selection and assignment.

use crate::error::{Error, Result};
use crate::range::{RangeInput, build_range, split_group_ids};
use crate::types::{Commit, CommitAssignment, CommitRange, PullRequest, UNASSIGNED};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

fn branch_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$")
            .unwrap_or_else(|e| panic!("invalid branch name pattern: {e}"))
    })
}

/// Whether `id` can be used as a group id, which is also a branch name
pub fn is_valid_group_id(id: &str) -> bool {
    branch_name_re().is_match(id)
        && id != UNASSIGNED
        && !id.contains("..")
        && !id.contains("//")
        && !id.ends_with('/')
        && !id.ends_with('.')
        && !id.ends_with(".lock")
}

/// One row of the editor list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorItem<'a> {
    /// The commit shown on this row
    pub commit: &'a Commit,
    /// Group the commit is assigned to
    pub group_id: Option<&'a str>,
    /// Whether the commit belongs to any group
    pub selected: bool,
    /// Whether the commit belongs to a group other than the current one
    pub disabled: bool,
}

/// Assignment editor over one branch's commits
#[derive(Debug, Clone)]
pub struct RangeEditor {
    commits: Vec<Commit>,
    assignment: CommitAssignment,
    pull_requests: HashMap<String, PullRequest>,
    trunk: String,
    range: CommitRange,
    /// Groups created in the editor that have no commits yet
    added: Vec<String>,
    selected: usize,
}

impl RangeEditor {
    /// Start editing from the current assignment
    pub fn new(
        commits: Vec<Commit>,
        assignment: CommitAssignment,
        pull_requests: HashMap<String, PullRequest>,
        trunk: impl Into<String>,
    ) -> Result<Self> {
        let trunk = trunk.into();
        let range = build_range(&RangeInput {
            commits: &commits,
            assignment: &assignment,
            pull_requests: &pull_requests,
            trunk: &trunk,
        })?;

        Ok(Self {
            commits,
            assignment,
            pull_requests,
            trunk,
            range,
            added: Vec::new(),
            selected: 0,
        })
    }

    /// Current derived range
    pub const fn range(&self) -> &CommitRange {
        &self.range
    }

    /// Current assignment
    pub const fn assignment(&self) -> &CommitAssignment {
        &self.assignment
    }

    /// Selectable group ids: published groups in stack order, then new ones
    pub fn group_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .range
            .published_groups()
            .map(|g| g.id.as_str())
            .collect();
        ids.extend(
            self.added
                .iter()
                .map(String::as_str)
                .filter(|id| self.range.group(id).is_none()),
        );
        ids
    }

    /// Group currently being edited
    pub fn current_group(&self) -> Option<&str> {
        self.group_ids().get(self.selected).copied()
    }

    /// Position of the current group and the number of groups
    pub fn position(&self) -> (usize, usize) {
        (self.selected, self.group_ids().len())
    }

    /// Display title of the current group
    pub fn current_title(&self) -> Option<&str> {
        let id = self.current_group()?;
        Some(self.range.group(id).map_or(id, |g| g.title.as_str()))
    }

    /// Select the next group, wrapping around
    pub fn next_group(&mut self) {
        let len = self.group_ids().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Select the previous group, wrapping around
    pub fn prev_group(&mut self) {
        let len = self.group_ids().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Rows for the list, newest commit first
    pub fn items(&self) -> Vec<EditorItem<'_>> {
        let current = self.current_group();
        self.commits
            .iter()
            .rev()
            .map(|commit| {
                let group_id = self.assignment.get(&commit.sha).flatten();
                let selected = group_id.is_some();
                EditorItem {
                    commit,
                    group_id,
                    selected,
                    disabled: selected && group_id != current,
                }
            })
            .collect()
    }

    /// Flip a commit in or out of the current group
    ///
    /// Commits owned by another group are left alone. Returns whether the
    /// assignment changed.
    pub fn toggle(&mut self, sha: &str) -> Result<bool> {
        let Some(current) = self.current_group().map(ToString::to_string) else {
            return Ok(false);
        };

        let owner = self.lookup(sha)?.map(ToString::to_string);
        match owner {
            None => self.assign(sha, &current).map(|()| true),
            Some(id) if id == current => self.unassign(sha).map(|()| true),
            Some(_) => Ok(false),
        }
    }

    /// Assign a commit to an existing or newly added group
    pub fn assign(&mut self, sha: &str, group_id: &str) -> Result<()> {
        self.lookup(sha)?;
        if !self.group_ids().contains(&group_id) {
            return Err(Error::InvalidRange(format!("unknown group '{group_id}'")));
        }

        let mut assignment = self.assignment.clone();
        assignment.assign(sha, group_id);
        self.rederive(assignment)
    }

    /// Remove a commit from its group
    pub fn unassign(&mut self, sha: &str) -> Result<()> {
        self.lookup(sha)?;
        let mut assignment = self.assignment.clone();
        assignment.unassign(sha);
        self.rederive(assignment)
    }

    /// Create a new, empty group and select it
    pub fn add_group(&mut self, id: &str) -> Result<()> {
        if !is_valid_group_id(id) {
            return Err(Error::InvalidRange(format!(
                "'{id}' is not a valid branch name"
            )));
        }
        if self.group_ids().contains(&id) {
            return Err(Error::InvalidRange(format!("group '{id}' already exists")));
        }

        self.added.push(id.to_string());
        self.selected = self.group_ids().len() - 1;
        debug!(group = id, "added group");
        Ok(())
    }

    /// Stop editing, yielding the final assignment and range
    pub fn finish(self) -> (CommitAssignment, CommitRange) {
        (self.assignment, self.range)
    }

    fn lookup(&self, sha: &str) -> Result<Option<&str>> {
        self.assignment
            .get(sha)
            .ok_or_else(|| Error::InvalidRange(format!("unknown commit {sha}")))
    }

    /// Rebuild the range; a split group leaves the editor unchanged
    fn rederive(&mut self, assignment: CommitAssignment) -> Result<()> {
        let range = build_range(&RangeInput {
            commits: &self.commits,
            assignment: &assignment,
            pull_requests: &self.pull_requests,
            trunk: &self.trunk,
        })?;

        if let Some(id) = split_group_ids(&range).into_iter().next() {
            return Err(Error::NonContiguousGroup(id));
        }

        let current = self.current_group().map(ToString::to_string);
        self.assignment = assignment;
        self.range = range;

        // Keep the edited group selectable even after its last commit left
        if let Some(id) = current {
            if self.range.group(&id).is_none() && !self.added.contains(&id) {
                self.added.push(id.clone());
            }
            self.selected = self
                .group_ids()
                .iter()
                .position(|g| *g == id)
                .unwrap_or_default();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commits() -> Vec<Commit> {
        vec![
            Commit::new("c1", "Scratch"),
            Commit::new("c2", "Parser\n\ngit-stack-id: a"),
            Commit::new("c3", "Lexer\n\ngit-stack-id: a"),
            Commit::new("c4", "Docs\n\ngit-stack-id: b"),
        ]
    }

    fn editor() -> RangeEditor {
        let commits = commits();
        let assignment = CommitAssignment::from_commits(&commits);
        RangeEditor::new(commits, assignment, HashMap::new(), "main").unwrap()
    }

    fn ids(editor: &RangeEditor) -> Vec<(String, Vec<String>)> {
        editor
            .range()
            .group_list
            .iter()
            .map(|g| (g.id.clone(), g.commits.iter().map(|c| c.sha.clone()).collect()))
            .collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut editor = editor();
        assert_eq!(editor.current_group(), Some("a"));
        editor.next_group();
        assert_eq!(editor.current_group(), Some("b"));
        editor.next_group();
        assert_eq!(editor.current_group(), Some("a"));
        editor.prev_group();
        assert_eq!(editor.current_group(), Some("b"));
        assert_eq!(editor.position(), (1, 2));
    }

    #[test]
    fn test_items_newest_first_with_flags() {
        let editor = editor();
        let items = editor.items();
        let shas: Vec<&str> = items.iter().map(|i| i.commit.sha.as_str()).collect();
        assert_eq!(shas, ["c4", "c3", "c2", "c1"]);

        // current group is "a"
        assert!(items[0].selected && items[0].disabled);
        assert!(items[1].selected && !items[1].disabled);
        assert!(!items[3].selected && !items[3].disabled);
    }

    #[test]
    fn test_reassign_adjacent_commit() {
        let mut editor = editor();
        editor.assign("c3", "b").unwrap();
        assert_eq!(
            ids(&editor),
            vec![
                (UNASSIGNED.to_string(), vec!["c1".to_string()]),
                ("a".to_string(), vec!["c2".to_string()]),
                ("b".to_string(), vec!["c3".to_string(), "c4".to_string()]),
            ]
        );
        assert_eq!(editor.range().group("b").unwrap().base, "a");
    }

    #[test]
    fn test_non_contiguous_assignment_rejected() {
        let mut editor = editor();
        let before = editor.assignment().clone();

        let err = editor.assign("c2", "b").unwrap_err();
        assert!(matches!(err, Error::NonContiguousGroup(ref id) if id == "b"));
        assert_eq!(editor.assignment(), &before);
        assert_eq!(editor.range().group("b").unwrap().commits.len(), 1);
    }

    #[test]
    fn test_toggle_respects_ownership() {
        let mut editor = editor();
        // c4 belongs to b while a is selected
        assert!(!editor.toggle("c4").unwrap());
        // c1 is unassigned and adjacent to a
        assert!(editor.toggle("c1").unwrap());
        assert_eq!(editor.range().group("a").unwrap().commits.len(), 3);
        assert!(editor.toggle("c1").unwrap());
        assert_eq!(editor.range().group("a").unwrap().commits.len(), 2);
    }

    #[test]
    fn test_add_group_and_assign() {
        let mut editor = editor();
        editor.add_group("feat-c").unwrap();
        assert_eq!(editor.current_group(), Some("feat-c"));
        assert_eq!(editor.current_title(), Some("feat-c"));

        editor.next_group();
        editor.next_group();
        assert_eq!(editor.current_group(), Some("b"));
        editor.next_group();
        editor.assign("c4", "feat-c").unwrap();

        assert_eq!(editor.current_group(), Some("feat-c"));
        assert!(editor.range().group("b").is_none());
        assert_eq!(editor.group_ids(), ["a", "feat-c"]);
    }

    #[test]
    fn test_emptied_current_group_stays_selected() {
        let mut editor = editor();
        editor.next_group();
        editor.unassign("c4").unwrap();

        assert!(editor.range().group("b").is_none());
        assert_eq!(editor.current_group(), Some("b"));
        assert!(!editor.items()[0].selected);
    }

    #[test]
    fn test_add_group_validation() {
        let mut editor = editor();
        for bad in ["", "-x", "a..b", "feat/", "x.lock", "has space", UNASSIGNED, "a"] {
            assert!(editor.add_group(bad).is_err(), "{bad} should be rejected");
        }
        assert!(editor.add_group("user/feature-1").is_ok());
    }

    #[test]
    fn test_unknown_commit_and_group() {
        let mut editor = editor();
        assert!(matches!(editor.toggle("zzz"), Err(Error::InvalidRange(_))));
        assert!(matches!(editor.assign("c1", "nope"), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_finish_returns_edited_state() {
        let mut editor = editor();
        editor.assign("c3", "b").unwrap();
        let (assignment, range) = editor.finish();
        assert_eq!(assignment.get("c3"), Some(Some("b")));
        assert_eq!(range.group_list.len(), 3);
    }
}
