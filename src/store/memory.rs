use crate::store::{revision_of, ContentStore, FileSnapshot, Revision, StoreError};
use std::collections::HashMap;

/// In-memory store with the same revision discipline as
/// [`crate::store::LocalStore`], for tests and embedders that stage
/// changes before a real push.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    files: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, bypassing the revision check.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn fetch(&self, path: &str) -> Result<Option<FileSnapshot>, StoreError> {
        Ok(self.files.get(path).map(|content| FileSnapshot {
            content: content.clone(),
            revision: revision_of(content),
        }))
    }

    fn push(
        &mut self,
        path: &str,
        content: &str,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        match (self.files.get(path), revision) {
            (Some(existing), Some(expected)) => {
                let found = revision_of(existing);
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

        self.files.insert(path.to_string(), content.to_string());
        Ok(revision_of(content))
    }

    fn delete(&mut self, path: &str, revision: &Revision) -> Result<(), StoreError> {
        let Some(existing) = self.files.get(path) else {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        };

        let found = revision_of(existing);
        if found != *revision {
            return Err(StoreError::StaleRevision {
                path: path.to_string(),
                expected: revision.as_str().to_string(),
                found: found.as_str().to_string(),
            });
        }

        self.files.remove(path);
        Ok(())
    }
}
