//! Chunk Patcher: patch application engine for LLM-proposed chunk edits
//!
//! A model proposes symbolic edit operations against files in a repository;
//! this engine translates them into exact, deterministic mutations of file
//! text before the result is pushed back.
//!
//! # Architecture
//!
//! Operations address their target one of two ways. Line-addressed edits
//! reference 1-based line numbers in the original file and are applied
//! bottom-up so earlier numbering never shifts under a pending edit.
//! Anchor-addressed edits locate a fuzzy content anchor in the current
//! buffer and fold over it sequentially. The [`PatchSet`] applies one
//! file's operations; [`apply_changes`] drives a whole change list across
//! files through a [`ContentStore`].
//!
//! # Failure posture
//!
//! - Per-operation failures (missed anchors, stale line references, bounds
//!   violations) are skipped with a [`Diagnostic`] and never abort the set
//! - A missed anchor carries candidate context snippets for model
//!   self-correction
//! - Store writes use optimistic concurrency: content-hash revision
//!   tokens, stale tokens surface as conflicts
//! - Untrusted wire paths are confined to the workspace root
//!
//! # Example
//!
//! ```
//! use chunk_patcher::{apply_changes, ChangeList, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.insert("app.py", "def f():\n    pass");
//!
//! let list = ChangeList::from_json(
//!     r#"[{"action": "replace", "file": "app.py",
//!          "search": "    pass", "replace": "    return 1"}]"#,
//! )
//! .unwrap();
//!
//! let reports = apply_changes(&mut store, &list.changes);
//! assert_eq!(reports[0].to_string(), "Updated app.py");
//! assert_eq!(store.get("app.py"), Some("def f():\n    return 1"));
//! ```

pub mod driver;
pub mod engine;
pub mod op;
pub mod safety;
pub mod store;

// Re-exports
pub use driver::{
    apply_changes, preview_changes, FilePlan, FileReport, FileStatus, PlannedAction,
};
pub use engine::{ApplicationOutcome, Diagnostic, FileOutcome, PatchSet};
pub use op::{ChangeList, Operation, OperationError, Position, RawChange};
pub use safety::{SafetyError, WorkspaceGuard};
pub use store::{
    revision_of, ContentStore, FileSnapshot, LocalStore, MemoryStore, Revision, StoreError,
};
