use crate::op::OperationError;
use std::fmt;

/// A non-fatal, logged explanation of a skipped operation.
///
/// Diagnostics accumulate in operation order; they never abort the
/// surrounding patch set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The wire record could not be converted into an operation.
    Rejected(OperationError),
    /// A line index fell outside the valid range of the buffer.
    OutOfBounds { line: i64, len: usize },
    /// The lines at an erase target did not match the operation content.
    ContentMismatch {
        line: i64,
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A search anchor was absent from the buffer.
    AnchorNotFound {
        search: String,
        suggestions: Vec<String>,
    },
    /// A search anchor occurred more than once; the first occurrence was
    /// used.
    AmbiguousMatch { search: String, count: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Rejected(err) => write!(f, "skipped: {err}"),
            Diagnostic::OutOfBounds { line, len } => {
                write!(f, "skipped: line {line} is out of bounds ({len} lines)")
            }
            Diagnostic::ContentMismatch {
                line,
                expected,
                found,
            } => {
                write!(
                    f,
                    "skipped erase at line {line}: content mismatch (expected {expected:?}, found {found:?})"
                )
            }
            Diagnostic::AnchorNotFound {
                search,
                suggestions,
            } => {
                write!(f, "anchor not found: {search:?}")?;
                for (idx, candidate) in suggestions.iter().enumerate() {
                    write!(f, "\n  did you mean ({}):\n{}", idx + 1, indent(candidate))?;
                }
                Ok(())
            }
            Diagnostic::AmbiguousMatch { search, count } => {
                write!(
                    f,
                    "anchor {search:?} matches {count} locations; applied the first"
                )
            }
        }
    }
}

impl From<OperationError> for Diagnostic {
    fn from(err: OperationError) -> Self {
        Diagnostic::Rejected(err)
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_renders_line_and_len() {
        let d = Diagnostic::OutOfBounds { line: 12, len: 4 };
        assert_eq!(d.to_string(), "skipped: line 12 is out of bounds (4 lines)");
    }

    #[test]
    fn anchor_not_found_lists_suggestions() {
        let d = Diagnostic::AnchorNotFound {
            search: "def f():".to_string(),
            suggestions: vec!["def f(x):\n    pass".to_string()],
        };
        let rendered = d.to_string();
        assert!(rendered.contains("anchor not found"));
        assert!(rendered.contains("did you mean (1)"));
        assert!(rendered.contains("    def f(x):"));
    }

    #[test]
    fn rejected_wraps_operation_error() {
        let d = Diagnostic::from(OperationError::UnknownAction {
            action: "rename".to_string(),
        });
        assert_eq!(d.to_string(), "skipped: unknown action 'rename'");
    }
}
