use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::repository::RepositoryRef;
use crate::source::RepositorySource;

/// Reads file contents through a `RepositorySource`, remembering every
/// successful read for the current repository session.
///
/// The cache is keyed by repository id and path and is dropped wholesale
/// when the session moves to another repository. Failed reads are not
/// cached and are not retried.
pub struct ContentFetcher<S> {
    source: Arc<S>,
    current: Option<RepositoryRef>,
    cache: HashMap<(String, String), Arc<str>>,
}

impl<S: RepositorySource> ContentFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        ContentFetcher {
            source,
            current: None,
            cache: HashMap::new(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn current_repository(&self) -> Option<&RepositoryRef> {
        self.current.as_ref()
    }

    /// Start a session for `repo`. Clears the cache if it differs from the
    /// current one.
    pub fn switch_repository(&mut self, repo: &RepositoryRef) {
        if self.current.as_ref() == Some(repo) {
            return;
        }
        if !self.cache.is_empty() {
            log::debug!(
                "Dropping {} cached files on switch to {}",
                self.cache.len(),
                repo
            );
        }
        self.cache.clear();
        self.current = Some(repo.clone());
    }

    pub fn is_cached(&self, repo: &RepositoryRef, path: &str) -> bool {
        self.cache.contains_key(&(repo.id(), path.to_string()))
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub async fn fetch(&mut self, repo: &RepositoryRef, path: &str) -> Result<Arc<str>> {
        self.switch_repository(repo);
        let key = (repo.id(), path.to_string());
        if let Some(content) = self.cache.get(&key) {
            log::debug!("Cache hit for {}:{}", repo, path);
            return Ok(Arc::clone(content));
        }

        log::debug!("Cache miss for {}:{}", repo, path);
        let content: Arc<str> = self.source.read_file(repo, path).await?.into();
        self.cache.insert(key, Arc::clone(&content));
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrowseError;
    use crate::source::MemorySource;

    fn repo_a() -> RepositoryRef {
        RepositoryRef::new("acme", "a", "main")
    }

    fn repo_b() -> RepositoryRef {
        RepositoryRef::new("acme", "b", "main")
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_file(&repo_a(), "x.json", "{\"a\":1}")
                .with_file(&repo_b(), "x.json", "{\"b\":2}"),
        )
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let source = source();
        let mut fetcher = ContentFetcher::new(Arc::clone(&source));

        let first = fetcher.fetch(&repo_a(), "x.json").await.unwrap();
        let second = fetcher.fetch(&repo_a(), "x.json").await.unwrap();

        assert_eq!(&*first, "{\"a\":1}");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.read_count(&repo_a(), "x.json"), 1);
    }

    #[tokio::test]
    async fn switching_repository_forces_a_new_read() {
        let source = source();
        let mut fetcher = ContentFetcher::new(Arc::clone(&source));

        fetcher.fetch(&repo_a(), "x.json").await.unwrap();
        let other = fetcher.fetch(&repo_b(), "x.json").await.unwrap();

        assert_eq!(&*other, "{\"b\":2}");
        assert_eq!(source.read_count(&repo_b(), "x.json"), 1);
        assert!(!fetcher.is_cached(&repo_a(), "x.json"));

        // Coming back to A starts a fresh session as well.
        fetcher.fetch(&repo_a(), "x.json").await.unwrap();
        assert_eq!(source.read_count(&repo_a(), "x.json"), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = source();
        let mut fetcher = ContentFetcher::new(Arc::clone(&source));

        source.fail_with(Some(BrowseError::Network("offline".into())));
        let err = fetcher.fetch(&repo_a(), "x.json").await.unwrap_err();
        assert!(matches!(err, BrowseError::Network(_)));
        assert_eq!(fetcher.cached_len(), 0);

        source.fail_with(None);
        assert!(fetcher.fetch(&repo_a(), "x.json").await.is_ok());
        assert_eq!(source.read_count(&repo_a(), "x.json"), 2);
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let mut fetcher = ContentFetcher::new(source());
        let err = fetcher.fetch(&repo_a(), "nope.json").await.unwrap_err();
        assert_eq!(err, BrowseError::NotFound("nope.json".to_string()));
    }
}
