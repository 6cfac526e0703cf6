use serde::Deserialize;
use thiserror::Error;

/// Where an anchored insert lands relative to its search anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
    Start,
    End,
}

/// One validated edit instruction.
///
/// Line-addressed variants (`LineInsert`, `LineErase`) reference 1-based
/// line numbers in the original file content. Anchor-addressed variants
/// (`Replace`, `Erase`, `Insert`) locate their target by fuzzy content
/// search against the current buffer. `Write` and `DeleteFile` are valid in
/// either mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace the entire file content.
    Write { content: String },
    /// Signal removal of the file.
    DeleteFile,
    /// Splice `content` into the file at a 1-based line index.
    LineInsert { line: i64, content: String },
    /// Remove the span of lines starting at `line` whose text equals
    /// `content` exactly.
    LineErase { line: i64, content: String },
    /// Find `search` and substitute `replace`.
    Replace { search: String, replace: String },
    /// Find `search` and delete it.
    Erase { search: String },
    /// Insert `insert` relative to an anchor, or unconditionally at file
    /// start/end.
    Insert {
        search: Option<String>,
        insert: String,
        position: Position,
    },
}

/// Rejection of a single wire record. Never aborts the surrounding change
/// set; the record is skipped with a diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("operation '{action}' missing required field '{field}'")]
    MalformedOperation { action: String, field: &'static str },

    #[error("operation '{action}' has unrecognized position '{position}'")]
    InvalidPosition { action: String, position: String },

    #[error("unknown action '{action}'")]
    UnknownAction { action: String },
}

/// Untyped wire record as produced by the model:
/// `{action, file, line?, content?, search?, replace?, insert?, position?}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawChange {
    pub action: String,
    pub file: String,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub insert: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl Operation {
    /// Convert a wire record into a typed operation.
    ///
    /// `insert` and `erase` records carrying a `line` field are
    /// line-addressed and use `content`; without `line` they are
    /// anchor-addressed and use `search`/`insert`.
    pub fn from_raw(raw: &RawChange) -> Result<Operation, OperationError> {
        match raw.action.as_str() {
            "write" => Ok(Operation::Write {
                content: require_field(raw, raw.content.clone(), "content")?,
            }),
            "delete_file" => Ok(Operation::DeleteFile),
            "replace" => Ok(Operation::Replace {
                search: require_search(raw)?,
                // A missing replacement is an erase in disguise.
                replace: raw.replace.clone().unwrap_or_default(),
            }),
            "insert" => match raw.line {
                Some(line) => Ok(Operation::LineInsert {
                    line,
                    content: require_field(raw, raw.content.clone(), "content")?,
                }),
                None => {
                    let position = parse_position(raw)?;
                    let search = match position {
                        Position::Start | Position::End => raw.search.clone(),
                        Position::Before | Position::After => Some(require_search(raw)?),
                    };
                    Ok(Operation::Insert {
                        search,
                        insert: require_field(raw, raw.insert.clone(), "insert")?,
                        position,
                    })
                }
            },
            "erase" => match raw.line {
                Some(line) => Ok(Operation::LineErase {
                    line,
                    content: require_field(raw, raw.content.clone(), "content")?,
                }),
                None => Ok(Operation::Erase {
                    search: require_search(raw)?,
                }),
            },
            _ => Err(OperationError::UnknownAction {
                action: raw.action.clone(),
            }),
        }
    }

    /// True for operations addressed by line number.
    pub fn is_line_addressed(&self) -> bool {
        matches!(
            self,
            Operation::LineInsert { .. } | Operation::LineErase { .. }
        )
    }

    /// True for operations addressed by content anchor.
    pub fn is_anchor_addressed(&self) -> bool {
        matches!(
            self,
            Operation::Replace { .. } | Operation::Erase { .. } | Operation::Insert { .. }
        )
    }
}

fn require_field(
    raw: &RawChange,
    value: Option<String>,
    field: &'static str,
) -> Result<String, OperationError> {
    value.ok_or_else(|| OperationError::MalformedOperation {
        action: raw.action.clone(),
        field,
    })
}

/// A search anchor must be present and non-blank; a whitespace-only anchor
/// cannot identify a location.
fn require_search(raw: &RawChange) -> Result<String, OperationError> {
    match &raw.search {
        Some(search) if !search.trim().is_empty() => Ok(search.clone()),
        _ => Err(OperationError::MalformedOperation {
            action: raw.action.clone(),
            field: "search",
        }),
    }
}

fn parse_position(raw: &RawChange) -> Result<Position, OperationError> {
    match raw.position.as_deref() {
        // "after" is the dominant case in practice; treat it as the default.
        None => Ok(Position::After),
        Some("before") => Ok(Position::Before),
        Some("after") => Ok(Position::After),
        Some("start") => Ok(Position::Start),
        Some("end") => Ok(Position::End),
        Some(other) => Err(OperationError::InvalidPosition {
            action: raw.action.clone(),
            position: other.to_string(),
        }),
    }
}

/// A parsed model response: an optional message plus the flat list of
/// change records, in arrival order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ChangeList {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub changes: Vec<RawChange>,
}

impl ChangeList {
    /// Parse either the full response envelope `{"message", "changes"}` or
    /// a bare array of change records.
    pub fn from_json(input: &str) -> Result<ChangeList, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        if value.is_array() {
            let changes: Vec<RawChange> = serde_json::from_value(value)?;
            return Ok(ChangeList {
                message: None,
                changes,
            });
        }
        serde_json::from_value(value)
    }

    /// Parse a raw model response that may surround the JSON envelope with
    /// chatter or markdown fences: the outermost `{...}` span is extracted
    /// and parsed; if that fails, the trimmed text is parsed as-is.
    pub fn from_llm_text(text: &str) -> Result<ChangeList, serde_json::Error> {
        let trimmed = text.trim();
        if trimmed.starts_with('[') {
            return ChangeList::from_json(trimmed);
        }
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                if let Ok(parsed) = ChangeList::from_json(&text[start..=end]) {
                    return Ok(parsed);
                }
            }
        }
        ChangeList::from_json(trimmed)
    }
}
