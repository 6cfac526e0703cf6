//! Content store boundary: where file content lives between applications.
//!
//! The engine mutates in-memory buffers only; all storage I/O goes through
//! [`ContentStore`]. Writes follow optimistic concurrency: fetch a revision
//! token with the content, mutate locally, and push conditioned on the
//! token still being current. A stale token surfaces as
//! [`StoreError::StaleRevision`] rather than a silent overwrite.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::safety::SafetyError;
use std::fmt;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Opaque optimistic-concurrency token for one file revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Revision(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Revision token derived from content: the xxh3-64 hex of the bytes.
pub fn revision_of(content: &str) -> Revision {
    Revision(format!("{:016x}", xxh3_64(content.as_bytes())))
}

/// A file's content together with the revision token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub content: String,
    pub revision: Revision,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("stale revision for {path}: expected {expected}, found {found}")]
    StaleRevision {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path} already exists; fetch it and push with its revision")]
    AlreadyExists { path: String },

    #[error("file is not valid UTF-8: {path}")]
    InvalidUtf8 { path: String },

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Fetch/push/delete against wherever file content lives.
///
/// `push` with `None` creates a new file and fails if one already exists;
/// `push` with `Some(revision)` requires the stored content to still match
/// that revision. `delete` likewise requires a current revision.
pub trait ContentStore {
    fn fetch(&self, path: &str) -> Result<Option<FileSnapshot>, StoreError>;

    fn push(
        &mut self,
        path: &str,
        content: &str,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError>;

    fn delete(&mut self, path: &str, revision: &Revision) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_is_stable_for_equal_content() {
        assert_eq!(revision_of("abc"), revision_of("abc"));
        assert_ne!(revision_of("abc"), revision_of("abd"));
    }

    #[test]
    fn revision_renders_as_hex() {
        let rev = revision_of("hello");
        assert_eq!(rev.as_str().len(), 16);
        assert!(rev.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
