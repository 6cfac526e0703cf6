//! The patch application engine.
//!
//! A [`PatchSet`] carries the ordered operations for one target file and
//! applies them to the file's current text, producing either new content or
//! a deletion signal plus an ordered log of skipped sub-operations.
//!
//! Line-addressed operations are applied bottom-up against the original
//! numbering; anchor-addressed operations fold over the buffer
//! sequentially. A mixed set runs its line-mode slice first, then folds
//! the anchor slice over the result.

mod anchor;
mod line;

pub mod diagnostic;
pub mod normalize;
pub mod suggest;

pub use diagnostic::Diagnostic;

use crate::op::Operation;

/// The ordered list of operations scoped to one target file for one
/// application pass.
///
/// A `PatchSet` is constructed once per (file, request) pair, applied once,
/// and discarded; it holds no identity beyond the single application call.
#[derive(Debug, Clone)]
pub struct PatchSet {
    pub file: String,
    pub operations: Vec<Operation>,
}

/// What the caller should do with the file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileOutcome decides whether to push or delete"]
pub enum FileOutcome {
    /// Push this content back to the store.
    Updated(String),
    /// Remove the file from the store.
    Deleted,
}

/// Result of applying one patch set: the outcome plus the ordered log of
/// skipped or failed sub-operations (all non-fatal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationOutcome {
    pub outcome: FileOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

impl PatchSet {
    pub fn new(file: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            file: file.into(),
            operations,
        }
    }

    /// Apply the set to the file's current text.
    ///
    /// Operation failures (missed anchors, stale line references, bounds
    /// violations) are recovered locally: the operation is skipped, a
    /// diagnostic is logged, and application continues. The only
    /// set-terminating condition is an explicit `DeleteFile`: the outcome
    /// is `Deleted` regardless of its position, operations before it still
    /// run (keeping their diagnostics), and operations after it never
    /// execute and log nothing.
    pub fn apply(&self, original: &str) -> ApplicationOutcome {
        let mut diagnostics = Vec::new();

        let cutoff = self
            .operations
            .iter()
            .position(|op| matches!(op, Operation::DeleteFile));
        let effective = &self.operations[..cutoff.unwrap_or(self.operations.len())];

        let applied = Self::run(effective, original, &mut diagnostics);
        let outcome = if cutoff.is_some() {
            FileOutcome::Deleted
        } else {
            applied
        };

        ApplicationOutcome {
            outcome,
            diagnostics,
        }
    }

    fn run(
        operations: &[Operation],
        original: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> FileOutcome {
        let uses_lines = operations.iter().any(Operation::is_line_addressed);
        if !uses_lines {
            let ops: Vec<&Operation> = operations.iter().collect();
            return match anchor::apply(original, &ops, diagnostics) {
                anchor::AnchorPass::Updated(text) => FileOutcome::Updated(text),
                anchor::AnchorPass::Deleted => FileOutcome::Deleted,
            };
        }

        // Line numbers are only meaningful against the original content, so
        // the line-mode slice (with any Write) runs first; the anchor slice
        // then folds over the result.
        let (line_ops, anchor_ops): (Vec<&Operation>, Vec<&Operation>) = operations
            .iter()
            .partition(|op| !op.is_anchor_addressed());

        let text = match line::apply(original, &line_ops, diagnostics) {
            line::LinePass::Deleted => return FileOutcome::Deleted,
            line::LinePass::Updated(text) => text,
        };

        if anchor_ops.is_empty() {
            return FileOutcome::Updated(text);
        }
        match anchor::apply(&text, &anchor_ops, diagnostics) {
            anchor::AnchorPass::Updated(text) => FileOutcome::Updated(text),
            anchor::AnchorPass::Deleted => FileOutcome::Deleted,
        }
    }
}
