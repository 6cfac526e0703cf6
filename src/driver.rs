//! Drives change lists across files: group by target file, fetch, apply,
//! write back.
//!
//! Each file's pipeline is isolated — a store failure on one file is
//! reported in that file's entry and never aborts the others. Within a
//! file, operation order is the arrival order from the wire.

use crate::engine::{Diagnostic, FileOutcome, PatchSet};
use crate::op::{Operation, RawChange};
use crate::store::{ContentStore, Revision, StoreError};
use std::fmt;

/// Planned outcome for one file, before any store mutation.
#[derive(Debug)]
pub struct FilePlan {
    pub file: String,
    /// Content fetched from the store, if the file existed.
    pub original: Option<String>,
    /// Revision token held for the optimistic write-back.
    pub revision: Option<Revision>,
    pub action: PlannedAction,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub enum PlannedAction {
    /// Push this content using the held revision.
    Update { content: String },
    /// Issue the store delete with the held revision.
    Delete,
    /// Deletion requested but the file does not exist in the store.
    SkipDelete,
    /// The store failed before application; sibling files are unaffected.
    Fail { error: StoreError },
}

/// Result of driving one file's patch set through the store.
#[derive(Debug)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub enum FileStatus {
    Updated { revision: Revision },
    Deleted,
    SkippedDelete,
    Failed { error: StoreError },
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FileStatus::Updated { .. } => write!(f, "Updated {}", self.file),
            FileStatus::Deleted => write!(f, "Deleted {}", self.file),
            FileStatus::SkippedDelete => {
                write!(f, "Skipped delete {} (file not found)", self.file)
            }
            FileStatus::Failed { error } => {
                write!(f, "Failed to update {}: {}", self.file, error)
            }
        }
    }
}

/// Compute per-file plans without mutating the store.
pub fn preview_changes<S: ContentStore>(store: &S, changes: &[RawChange]) -> Vec<FilePlan> {
    group_by_file(changes)
        .into_iter()
        .map(|(file, group)| plan_file(store, file, &group))
        .collect()
}

/// Apply a flat change list: plan every file, then execute each plan
/// against the store. Returns one report per target file, in first-seen
/// file order.
pub fn apply_changes<S: ContentStore>(store: &mut S, changes: &[RawChange]) -> Vec<FileReport> {
    let plans = preview_changes(store, changes);
    plans
        .into_iter()
        .map(|plan| execute_plan(store, plan))
        .collect()
}

/// Group records by target file, preserving first-seen file order and
/// within-file arrival order.
fn group_by_file(changes: &[RawChange]) -> Vec<(String, Vec<&RawChange>)> {
    let mut groups: Vec<(String, Vec<&RawChange>)> = Vec::new();
    for change in changes {
        match groups.iter_mut().find(|(file, _)| *file == change.file) {
            Some((_, group)) => group.push(change),
            None => groups.push((change.file.clone(), vec![change])),
        }
    }
    groups
}

fn plan_file<S: ContentStore>(store: &S, file: String, group: &[&RawChange]) -> FilePlan {
    let mut diagnostics = Vec::new();
    let mut operations = Vec::new();
    for raw in group {
        match Operation::from_raw(raw) {
            Ok(op) => operations.push(op),
            Err(err) => diagnostics.push(Diagnostic::from(err)),
        }
    }

    let snapshot = match store.fetch(&file) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            return FilePlan {
                file,
                original: None,
                revision: None,
                action: PlannedAction::Fail { error },
                diagnostics,
            };
        }
    };
    let (original, revision) = match snapshot {
        Some(snapshot) => (Some(snapshot.content), Some(snapshot.revision)),
        None => (None, None),
    };

    // A file absent from the store applies against an empty buffer; write
    // and insert-at-start create it.
    let outcome =
        PatchSet::new(file.clone(), operations).apply(original.as_deref().unwrap_or(""));
    diagnostics.extend(outcome.diagnostics);

    let action = match outcome.outcome {
        FileOutcome::Updated(content) => PlannedAction::Update { content },
        // Only delete when the store confirmed the file exists.
        FileOutcome::Deleted if revision.is_some() => PlannedAction::Delete,
        FileOutcome::Deleted => PlannedAction::SkipDelete,
    };

    FilePlan {
        file,
        original,
        revision,
        action,
        diagnostics,
    }
}

fn execute_plan<S: ContentStore>(store: &mut S, plan: FilePlan) -> FileReport {
    let FilePlan {
        file,
        revision,
        action,
        diagnostics,
        ..
    } = plan;

    let status = match action {
        PlannedAction::Update { content } => {
            match store.push(&file, &content, revision.as_ref()) {
                Ok(revision) => FileStatus::Updated { revision },
                Err(error) => FileStatus::Failed { error },
            }
        }
        PlannedAction::Delete => match revision {
            Some(revision) => match store.delete(&file, &revision) {
                Ok(()) => FileStatus::Deleted,
                Err(error) => FileStatus::Failed { error },
            },
            None => FileStatus::SkippedDelete,
        },
        PlannedAction::SkipDelete => FileStatus::SkippedDelete,
        PlannedAction::Fail { error } => FileStatus::Failed { error },
    };

    FileReport {
        file,
        status,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileSnapshot, MemoryStore};

    fn changes(json: &str) -> Vec<RawChange> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let list = changes(
            r#"[
                {"action": "erase", "file": "b.py", "search": "x"},
                {"action": "erase", "file": "a.py", "search": "y"},
                {"action": "erase", "file": "b.py", "search": "z"}
            ]"#,
        );
        let groups = group_by_file(&list);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b.py");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a.py");
    }

    #[test]
    fn apply_updates_existing_file() {
        let mut store = MemoryStore::new();
        store.insert("a.py", "x = 1\n");

        let reports = apply_changes(
            &mut store,
            &changes(r#"[{"action": "replace", "file": "a.py", "search": "x = 1", "replace": "x = 2"}]"#),
        );

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].to_string(), "Updated a.py");
        assert_eq!(store.get("a.py"), Some("x = 2\n"));
    }

    #[test]
    fn apply_creates_missing_file_via_write() {
        let mut store = MemoryStore::new();

        let reports = apply_changes(
            &mut store,
            &changes(r#"[{"action": "write", "file": "new.py", "content": "print('hi')"}]"#),
        );

        assert!(matches!(reports[0].status, FileStatus::Updated { .. }));
        assert_eq!(store.get("new.py"), Some("print('hi')"));
    }

    #[test]
    fn delete_of_missing_file_is_skipped() {
        let mut store = MemoryStore::new();

        let reports = apply_changes(
            &mut store,
            &changes(r#"[{"action": "delete_file", "file": "ghost.py"}]"#),
        );

        assert_eq!(
            reports[0].to_string(),
            "Skipped delete ghost.py (file not found)"
        );
    }

    #[test]
    fn delete_of_existing_file_goes_through() {
        let mut store = MemoryStore::new();
        store.insert("old.py", "legacy");

        let reports = apply_changes(
            &mut store,
            &changes(r#"[{"action": "delete_file", "file": "old.py"}]"#),
        );

        assert_eq!(reports[0].to_string(), "Deleted old.py");
        assert!(!store.contains("old.py"));
    }

    #[test]
    fn malformed_operation_is_logged_but_file_still_processed() {
        let mut store = MemoryStore::new();
        store.insert("a.py", "x = 1");

        let reports = apply_changes(
            &mut store,
            &changes(
                r#"[
                    {"action": "replace", "file": "a.py"},
                    {"action": "replace", "file": "a.py", "search": "x = 1", "replace": "x = 2"}
                ]"#,
            ),
        );

        assert!(matches!(reports[0].status, FileStatus::Updated { .. }));
        assert_eq!(reports[0].diagnostics.len(), 1);
        assert_eq!(store.get("a.py"), Some("x = 2"));
    }

    #[test]
    fn one_file_failure_does_not_abort_siblings() {
        struct Flaky(MemoryStore);

        impl ContentStore for Flaky {
            fn fetch(&self, path: &str) -> Result<Option<FileSnapshot>, StoreError> {
                if path == "bad.py" {
                    return Err(StoreError::Io {
                        path: path.to_string(),
                        source: std::io::Error::other("backend unreachable"),
                    });
                }
                self.0.fetch(path)
            }

            fn push(
                &mut self,
                path: &str,
                content: &str,
                revision: Option<&Revision>,
            ) -> Result<Revision, StoreError> {
                self.0.push(path, content, revision)
            }

            fn delete(&mut self, path: &str, revision: &Revision) -> Result<(), StoreError> {
                self.0.delete(path, revision)
            }
        }

        let mut inner = MemoryStore::new();
        inner.insert("good.py", "a");
        let mut store = Flaky(inner);

        let reports = apply_changes(
            &mut store,
            &changes(
                r#"[
                    {"action": "replace", "file": "bad.py", "search": "a", "replace": "b"},
                    {"action": "replace", "file": "good.py", "search": "a", "replace": "b"}
                ]"#,
            ),
        );

        assert!(reports[0].is_failure());
        assert_eq!(reports[1].to_string(), "Updated good.py");
        assert_eq!(store.0.get("good.py"), Some("b"));
    }

    #[test]
    fn preview_does_not_mutate_store() {
        let store = {
            let mut s = MemoryStore::new();
            s.insert("a.py", "x = 1");
            s
        };

        let plans = preview_changes(
            &store,
            &changes(r#"[{"action": "replace", "file": "a.py", "search": "x = 1", "replace": "x = 2"}]"#),
        );

        assert_eq!(plans.len(), 1);
        assert!(matches!(
            &plans[0].action,
            PlannedAction::Update { content } if content == "x = 2"
        ));
        assert_eq!(store.get("a.py"), Some("x = 1"));
    }
}
