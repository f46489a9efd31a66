//! The stage -> review -> apply/discard lifecycle for proposed change-sets.
//!
//! At most one change-set is staged at a time; a new proposal supersedes an
//! unreviewed one. Apply is a single synchronous pass over the operation
//! list with no suspension points, so readers can never observe a
//! half-applied workspace.

use std::fmt;

use atelier_common::{ChangeSet, FileAction, FileOperation};
use atelier_diff::{compute_diff, diff_stats, DiffLine, DiffStats};

use crate::Workspace;

/// Review label for one staged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeLabel {
    New,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Per-file line of the review summary.
#[derive(Debug, Clone)]
pub struct ChangeSummary {
    pub path: String,
    pub label: ChangeLabel,
    pub stats: DiffStats,
}

/// Holds the one change-set awaiting accept/reject.
#[derive(Debug, Default)]
pub struct PendingChanges {
    staged: Option<ChangeSet>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any staged change-set unconditionally; an unreviewed
    /// proposal is superseded, never merged.
    pub fn stage(&mut self, change_set: ChangeSet) {
        if self.staged.is_some() {
            tracing::info!("superseding unreviewed change-set");
        }
        self.staged = Some(change_set);
    }

    pub fn staged(&self) -> Option<&ChangeSet> {
        self.staged.as_ref()
    }

    /// Diff of the workspace's current content for `path` against the staged
    /// content. Missing file diffs from empty (covers create); delete diffs
    /// to empty (whole file shown as removed). When several operations
    /// target one path the last wins, matching apply order.
    pub fn preview(&self, workspace: &Workspace, path: &str) -> Option<Vec<DiffLine>> {
        let op = self.last_op_for(path)?;
        Some(preview_operation(workspace, op))
    }

    /// One summary row per staged operation, in list order, plus the
    /// aggregate totals for the change-set header.
    pub fn summaries(&self, workspace: &Workspace) -> (Vec<ChangeSummary>, DiffStats) {
        let mut rows = Vec::new();
        let mut totals = DiffStats::default();
        let Some(staged) = &self.staged else {
            return (rows, totals);
        };
        for op in &staged.operations {
            let stats = diff_stats(&preview_operation(workspace, op));
            totals.additions += stats.additions;
            totals.deletions += stats.deletions;
            rows.push(ChangeSummary {
                path: op.path.clone(),
                label: label_for(workspace, op),
                stats,
            });
        }
        (rows, totals)
    }

    /// Applies every staged operation in list order and clears the staged
    /// set. Returns the touched paths. Synchronous end to end: the caller
    /// holds `&mut Workspace` for the whole pass, so the transition is
    /// observed all-or-nothing.
    pub fn apply(&mut self, workspace: &mut Workspace) -> Vec<String> {
        let Some(staged) = self.staged.take() else {
            return Vec::new();
        };
        let mut touched = Vec::with_capacity(staged.operations.len());
        for op in &staged.operations {
            match op.action {
                FileAction::Create | FileAction::Modify => {
                    workspace.set_file(&op.path, op.content.as_deref().unwrap_or(""));
                    workspace.open_file(&op.path);
                    workspace.set_active_file(&op.path);
                }
                FileAction::Delete => {
                    workspace.delete_file(&op.path);
                }
            }
            touched.push(op.path.clone());
        }
        tracing::info!(files = touched.len(), "applied change-set");
        touched
    }

    /// Clears the staged change-set without touching the workspace.
    pub fn discard(&mut self) {
        if self.staged.take().is_some() {
            tracing::info!("discarded change-set");
        }
    }

    fn last_op_for(&self, path: &str) -> Option<&FileOperation> {
        self.staged
            .as_ref()?
            .operations
            .iter()
            .rev()
            .find(|op| op.path == path)
    }
}

fn preview_operation(workspace: &Workspace, op: &FileOperation) -> Vec<DiffLine> {
    let old = workspace.get_file(&op.path).unwrap_or("");
    let new = match op.action {
        FileAction::Delete => "",
        _ => op.content.as_deref().unwrap_or(""),
    };
    compute_diff(old, new)
}

fn label_for(workspace: &Workspace, op: &FileOperation) -> ChangeLabel {
    match op.action {
        FileAction::Delete => ChangeLabel::Deleted,
        // A "create" against an existing file reads as a modification.
        _ if workspace.get_file(&op.path).is_some() => ChangeLabel::Modified,
        _ => ChangeLabel::New,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_diff::DiffKind;

    fn op(path: &str, action: FileAction, content: Option<&str>) -> FileOperation {
        FileOperation {
            path: path.to_string(),
            action,
            content: content.map(str::to_string),
        }
    }

    fn change_set(ops: Vec<FileOperation>) -> ChangeSet {
        ChangeSet {
            message: "proposed".to_string(),
            operations: ops,
        }
    }

    #[test]
    fn apply_is_all_or_nothing_with_last_write_wins() {
        let mut ws = Workspace::new();
        ws.set_file("B", "old");
        ws.open_file("B");
        ws.set_active_file("B");

        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![
            op("A", FileAction::Create, Some("first")),
            op("B", FileAction::Delete, None),
            op("A", FileAction::Modify, Some("final")),
        ]));
        let touched = pending.apply(&mut ws);

        assert_eq!(touched, ["A", "B", "A"]);
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.get_file("A"), Some("final"));
        assert_eq!(ws.get_file("B"), None);
        assert_eq!(ws.active_file(), Some("A"));
        assert!(pending.staged().is_none());
    }

    #[test]
    fn apply_with_nothing_staged_is_a_no_op() {
        let mut ws = Workspace::new();
        ws.set_file("a.html", "keep");
        let mut pending = PendingChanges::new();
        assert!(pending.apply(&mut ws).is_empty());
        assert_eq!(ws.get_file("a.html"), Some("keep"));
    }

    #[test]
    fn discard_leaves_workspace_untouched() {
        let mut ws = Workspace::new();
        ws.set_file("a.html", "keep");
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![op(
            "a.html",
            FileAction::Modify,
            Some("clobber"),
        )]));
        pending.discard();
        assert!(pending.staged().is_none());
        assert_eq!(ws.get_file("a.html"), Some("keep"));
    }

    #[test]
    fn staging_supersedes_the_previous_proposal() {
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![op("one", FileAction::Create, Some("1"))]));
        pending.stage(change_set(vec![op("two", FileAction::Create, Some("2"))]));
        let staged = pending.staged().unwrap();
        assert_eq!(staged.operations.len(), 1);
        assert_eq!(staged.operations[0].path, "two");
    }

    #[test]
    fn preview_of_create_shows_all_added() {
        let ws = Workspace::new();
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![op(
            "styles.css",
            FileAction::Create,
            Some("body {}\n"),
        )]));
        let diff = pending.preview(&ws, "styles.css").unwrap();
        assert!(diff.iter().all(|l| l.kind == DiffKind::Added));
        assert!(pending.preview(&ws, "absent.js").is_none());
    }

    #[test]
    fn preview_of_delete_shows_all_removed() {
        let mut ws = Workspace::new();
        ws.set_file("styles.css", "body {}\nh1 {}");
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![op("styles.css", FileAction::Delete, None)]));
        let diff = pending.preview(&ws, "styles.css").unwrap();
        assert_eq!(diff.iter().filter(|l| l.kind == DiffKind::Removed).count(), 2);
    }

    #[test]
    fn preview_matches_the_operation_apply_will_keep() {
        let mut ws = Workspace::new();
        ws.set_file("A", "old");
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![
            op("A", FileAction::Modify, Some("draft")),
            op("A", FileAction::Modify, Some("final")),
        ]));
        let diff = pending.preview(&ws, "A").unwrap();
        assert!(diff.iter().any(|l| l.kind == DiffKind::Added && l.content == "final"));
    }

    #[test]
    fn summaries_report_labels_and_totals() {
        let mut ws = Workspace::new();
        ws.set_file("index.html", "a\nb");
        let mut pending = PendingChanges::new();
        pending.stage(change_set(vec![
            op("index.html", FileAction::Modify, Some("a\nc")),
            op("styles.css", FileAction::Create, Some("body {}")),
            op("old.js", FileAction::Delete, None),
        ]));
        let (rows, totals) = pending.summaries(&ws);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, ChangeLabel::Modified);
        assert_eq!(rows[1].label, ChangeLabel::New);
        assert_eq!(rows[2].label, ChangeLabel::Deleted);
        assert_eq!(rows[1].stats.additions, 1);
        assert_eq!(totals.additions, 2);
        assert_eq!(totals.deletions, 1);
    }
}
