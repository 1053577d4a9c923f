use std::collections::HashMap;
use std::sync::RwLock;

use super::RepositorySource;
use crate::error::{BrowseError, Result};
use crate::repository::{FlatEntry, RepositoryRef};

#[derive(Default)]
struct Repo {
    entries: Vec<FlatEntry>,
    files: HashMap<String, String>,
}

/// An in-memory `RepositorySource`, intended primarily for testing.
///
/// Counts reads per `(repository, path)` so callers can check caching.
#[derive(Default)]
pub struct MemorySource {
    repos: RwLock<HashMap<String, Repo>>,
    reads: RwLock<HashMap<(String, String), usize>>,
    failure: RwLock<Option<BrowseError>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; its parent directories are not listed separately.
    pub fn with_file(self, repo: &RepositoryRef, path: &str, content: &str) -> Self {
        {
            let mut repos = self.repos.write().unwrap();
            let entry = repos.entry(repo.id()).or_default();
            entry.entries.push(FlatEntry::file(path));
            entry.files.insert(path.to_string(), content.to_string());
        }
        self
    }

    pub fn with_directory(self, repo: &RepositoryRef, path: &str) -> Self {
        self.repos
            .write()
            .unwrap()
            .entry(repo.id())
            .or_default()
            .entries
            .push(FlatEntry::directory(path));
        self
    }

    /// Make every following call fail with `error` until cleared.
    pub fn fail_with(&self, error: Option<BrowseError>) {
        *self.failure.write().unwrap() = error;
    }

    pub fn read_count(&self, repo: &RepositoryRef, path: &str) -> usize {
        self.reads
            .read()
            .unwrap()
            .get(&(repo.id(), path.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.read().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RepositorySource for MemorySource {
    async fn list_repository_tree(&self, repo: &RepositoryRef) -> Result<Vec<FlatEntry>> {
        self.check_failure()?;
        let repos = self.repos.read().unwrap();
        repos
            .get(&repo.id())
            .map(|r| r.entries.clone())
            .ok_or_else(|| BrowseError::NotFound(repo.id()))
    }

    async fn read_file(&self, repo: &RepositoryRef, path: &str) -> Result<String> {
        *self
            .reads
            .write()
            .unwrap()
            .entry((repo.id(), path.to_string()))
            .or_default() += 1;
        self.check_failure()?;
        let repos = self.repos.read().unwrap();
        repos
            .get(&repo.id())
            .and_then(|r| r.files.get(path))
            .cloned()
            .ok_or_else(|| BrowseError::NotFound(path.to_string()))
    }
}
