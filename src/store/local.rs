use crate::safety::WorkspaceGuard;
use crate::store::{revision_of, ContentStore, FileSnapshot, Revision, StoreError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Workspace-rooted filesystem store.
///
/// Revision tokens are content hashes, so the optimistic check holds even
/// when another process rewrites a file between fetch and push. Writes are
/// atomic: tempfile in the target directory, fsync, rename.
#[derive(Debug)]
pub struct LocalStore {
    guard: WorkspaceGuard,
}

impl LocalStore {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            guard: WorkspaceGuard::new(workspace_root),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        self.guard.workspace_root()
    }

    fn read_current(&self, resolved: &Path, path: &str) -> Result<Option<String>, StoreError> {
        match fs::read(resolved) {
            Ok(bytes) => {
                let content =
                    String::from_utf8(bytes).map_err(|_| StoreError::InvalidUtf8 {
                        path: path.to_string(),
                    })?;
                Ok(Some(content))
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

impl ContentStore for LocalStore {
    fn fetch(&self, path: &str) -> Result<Option<FileSnapshot>, StoreError> {
        let resolved = self.guard.validate_path(path)?;
        Ok(self.read_current(&resolved, path)?.map(|content| {
            let revision = revision_of(&content);
            FileSnapshot { content, revision }
        }))
    }

    fn push(
        &mut self,
        path: &str,
        content: &str,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let resolved = self.guard.validate_path(path)?;
        let current = self.read_current(&resolved, path)?;

        match (current, revision) {
            (Some(existing), Some(expected)) => {
                let found = revision_of(&existing);
                if found != *expected {
                    return Err(StoreError::StaleRevision {
                        path: path.to_string(),
                        expected: expected.as_str().to_string(),
                        found: found.as_str().to_string(),
                    });
                }
            }
            (Some(_), None) => {
                return Err(StoreError::AlreadyExists {
                    path: path.to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                });
            }
            (None, None) => {}
        }

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: path.to_string(),
                source,
            })?;
        }
        atomic_write(&resolved, content.as_bytes()).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })?;

        Ok(revision_of(content))
    }

    fn delete(&mut self, path: &str, revision: &Revision) -> Result<(), StoreError> {
        let resolved = self.guard.validate_path(path)?;
        let Some(existing) = self.read_current(&resolved, path)? else {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        };

        let found = revision_of(&existing);
        if found != *revision {
            return Err(StoreError::StaleRevision {
                path: path.to_string(),
                expected: revision.as_str().to_string(),
                found: found.as_str().to_string(),
            });
        }

        fs::remove_file(&resolved).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the previous content remains.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.fetch("absent.py").unwrap().is_none());
    }

    #[test]
    fn push_creates_then_fetch_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());

        let rev = store.push("src/app.py", "x = 1", None).unwrap();
        let snapshot = store.fetch("src/app.py").unwrap().unwrap();
        assert_eq!(snapshot.content, "x = 1");
        assert_eq!(snapshot.revision, rev);
    }

    #[test]
    fn push_without_revision_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());

        store.push("a.py", "first", None).unwrap();
        let result = store.push("a.py", "second", None);
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn push_with_stale_revision_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());

        let rev = store.push("a.py", "first", None).unwrap();
        store.push("a.py", "second", Some(&rev)).unwrap();

        // The old token no longer matches the stored content.
        let result = store.push("a.py", "third", Some(&rev));
        assert!(matches!(result, Err(StoreError::StaleRevision { .. })));
    }

    #[test]
    fn delete_requires_current_revision() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());

        let rev = store.push("a.py", "content", None).unwrap();
        store.delete("a.py", &rev).unwrap();
        assert!(store.fetch("a.py").unwrap().is_none());
    }

    #[test]
    fn delete_with_stale_revision_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());

        store.push("a.py", "content", None).unwrap();
        let result = store.delete("a.py", &Revision::new("0000000000000000"));
        assert!(matches!(result, Err(StoreError::StaleRevision { .. })));
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path());
        let result = store.push("../escape.py", "x", None);
        assert!(matches!(result, Err(StoreError::Safety(_))));
    }
}
