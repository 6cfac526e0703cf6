//! Line-addressed application: edits reference 1-based line numbers in the
//! original file content, so the batch is applied bottom-up — an edit at a
//! higher line number never invalidates the numbering of edits applied
//! after it.

use crate::engine::diagnostic::Diagnostic;
use crate::op::Operation;

/// Result of the line-addressed pass over one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinePass {
    Updated(String),
    Deleted,
}

/// Apply line-addressed operations (plus any `Write`/`DeleteFile`) to the
/// buffer. Anchor-addressed operations must not be routed here.
pub(crate) fn apply(
    original: &str,
    ops: &[&Operation],
    diagnostics: &mut Vec<Diagnostic>,
) -> LinePass {
    let mut lines: Vec<String> = original.split('\n').map(str::to_string).collect();

    let mut ordered: Vec<&Operation> = ops.to_vec();
    // Descending (line, priority); the stable sort keeps arrival order for
    // ties. Erase outranks insert on the same line so the pair lands as a
    // clean replacement.
    ordered.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));

    for op in ordered {
        match op {
            Operation::LineInsert { line, content } => {
                insert_lines(&mut lines, *line, content, diagnostics);
            }
            Operation::LineErase { line, content } => {
                erase_lines(&mut lines, *line, content, diagnostics);
            }
            Operation::Write { content } => {
                lines = content.split('\n').map(str::to_string).collect();
            }
            Operation::DeleteFile => return LinePass::Deleted,
            _ => {}
        }
    }

    LinePass::Updated(lines.join("\n"))
}

/// Operations without a line number sort with line 0, placing them after
/// every numbered edit in the descending pass.
fn sort_key(op: &Operation) -> (i64, u8) {
    match op {
        Operation::DeleteFile => (0, 3),
        Operation::LineErase { line, .. } => (*line, 2),
        Operation::LineInsert { line, .. } => (*line, 1),
        _ => (0, 0),
    }
}

fn insert_lines(
    lines: &mut Vec<String>,
    line: i64,
    content: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let len = lines.len();
    let idx = line - 1;
    if idx < 0 || idx as usize > len + 1 {
        diagnostics.push(Diagnostic::OutOfBounds { line, len });
        return;
    }
    // A splice index one past the end appends.
    let at = (idx as usize).min(len);
    lines.splice(at..at, content.split('\n').map(str::to_string));
}

fn erase_lines(
    lines: &mut Vec<String>,
    line: i64,
    content: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let target: Vec<&str> = content.split('\n').collect();
    let span = target.len();
    let idx = line - 1;
    if idx < 0 || idx as usize + span > lines.len() {
        diagnostics.push(Diagnostic::OutOfBounds {
            line,
            len: lines.len(),
        });
        return;
    }

    let start = idx as usize;
    let current = &lines[start..start + span];
    if current.iter().map(String::as_str).eq(target.iter().copied()) {
        lines.drain(start..start + span);
    } else {
        diagnostics.push(Diagnostic::ContentMismatch {
            line,
            expected: target.iter().map(|s| s.to_string()).collect(),
            found: current.to_vec(),
        });
    }
}
