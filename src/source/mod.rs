mod github;
mod memory;

pub use github::{GitHubSource, GitHubSourceConfig};
pub use memory::MemorySource;

use std::future::Future;

use crate::error::Result;
use crate::repository::{FlatEntry, RepositoryRef};

/// Read access to a remote repository.
///
/// Implementations list a repository's full tree in one batch and read
/// individual files as text.
pub trait RepositorySource: Send + Sync {
    /// List every file and directory in the repository.
    ///
    /// Fails with `BrowseError::Auth` if the credential is missing or
    /// rejected, `BrowseError::Network` on transport failures.
    fn list_repository_tree(
        &self,
        repo: &RepositoryRef,
    ) -> impl Future<Output = Result<Vec<FlatEntry>>> + Send;

    /// Read one file's content.
    ///
    /// Returns `BrowseError::NotFound` if the path does not exist.
    fn read_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}
