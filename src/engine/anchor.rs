//! Anchor-addressed application: operations locate their target by content
//! search, so the buffer is folded through them sequentially in the given
//! order — each operation sees the effect of all prior operations.

use crate::engine::diagnostic::Diagnostic;
use crate::engine::normalize::{byte_of_char, locate};
use crate::engine::suggest::{suggest, DEFAULT_SUGGESTION_LIMIT};
use crate::op::{Operation, Position};

/// Result of the anchor-addressed pass over one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnchorPass {
    Updated(String),
    Deleted,
}

/// Apply anchor-addressed operations (plus any `Write`/`DeleteFile`) to the
/// buffer, in given order. Line-addressed operations must not be routed
/// here.
pub(crate) fn apply(
    original: &str,
    ops: &[&Operation],
    diagnostics: &mut Vec<Diagnostic>,
) -> AnchorPass {
    let mut buffer = original.to_string();

    for op in ops {
        match op {
            Operation::Replace { search, replace } => {
                replace_span(&mut buffer, search, replace, diagnostics);
            }
            Operation::Erase { search } => {
                replace_span(&mut buffer, search, "", diagnostics);
            }
            Operation::Insert {
                search,
                insert,
                position,
            } => {
                insert_relative(&mut buffer, search.as_deref(), insert, *position, diagnostics);
            }
            Operation::Write { content } => {
                buffer = content.clone();
            }
            Operation::DeleteFile => return AnchorPass::Deleted,
            _ => {}
        }
    }

    AnchorPass::Updated(buffer)
}

/// Substitute the original-text span covered by `search` with
/// `replacement`. The span length is the search text's character count,
/// measured from the mapped match offset.
fn replace_span(
    buffer: &mut String,
    search: &str,
    replacement: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(hit) = locate(buffer, search) else {
        diagnostics.push(not_found(buffer, search));
        return;
    };
    if hit.occurrences > 1 {
        diagnostics.push(Diagnostic::AmbiguousMatch {
            search: search.to_string(),
            count: hit.occurrences,
        });
    }
    let start = byte_of_char(buffer, hit.char_start);
    let end = byte_of_char(buffer, hit.char_start + search.chars().count());
    buffer.replace_range(start..end, replacement);
}

fn insert_relative(
    buffer: &mut String,
    search: Option<&str>,
    insert: &str,
    position: Position,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match position {
        Position::Start => buffer.insert_str(0, insert),
        Position::End => buffer.push_str(insert),
        Position::Before | Position::After => {
            let anchor = search.unwrap_or_default();
            let Some(hit) = locate(buffer, anchor) else {
                diagnostics.push(not_found(buffer, anchor));
                return;
            };
            if hit.occurrences > 1 {
                diagnostics.push(Diagnostic::AmbiguousMatch {
                    search: anchor.to_string(),
                    count: hit.occurrences,
                });
            }
            let at = match position {
                Position::Before => byte_of_char(buffer, hit.char_start),
                _ => byte_of_char(buffer, hit.char_start + anchor.chars().count()),
            };
            buffer.insert_str(at, insert);
        }
    }
}

fn not_found(buffer: &str, search: &str) -> Diagnostic {
    Diagnostic::AnchorNotFound {
        search: search.to_string(),
        suggestions: suggest(buffer, search, DEFAULT_SUGGESTION_LIMIT),
    }
}
