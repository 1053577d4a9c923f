use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BrowseError;

pub const DEFAULT_BRANCH: &str = "main";

/// A remote repository the browser is pointed at.
///
/// Parsed from `owner/name` or `owner/name@branch`. Once chosen it is never
/// mutated; picking another repository replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, branch: impl Into<String>) -> Self {
        RepositoryRef {
            owner: owner.into(),
            name: name.into(),
            branch: branch.into(),
        }
    }

    /// Stable identity used for cache keys: `owner/name@branch`.
    pub fn id(&self) -> String {
        format!("{}/{}@{}", self.owner, self.name, self.branch)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for RepositoryRef {
    type Err = BrowseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BrowseError::InvalidRepository(s.to_string());
        let s = s.trim();
        let (slug, branch) = match s.split_once('@') {
            Some((slug, branch)) if !branch.trim().is_empty() => (slug, branch.trim()),
            Some(_) => return Err(invalid()),
            None => (s, DEFAULT_BRANCH),
        };
        let slug = slug
            .trim_start_matches("https://github.com/")
            .trim_end_matches(".git")
            .trim_matches('/');
        let (owner, name) = slug.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(RepositoryRef::new(owner, name, branch))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One record of a repository listing: a slash-separated path and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub path: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl FlatEntry {
    pub fn file(path: impl Into<String>) -> Self {
        FlatEntry {
            path: path.into(),
            kind: EntryKind::File,
            sha: None,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        FlatEntry {
            path: path.into(),
            kind: EntryKind::Directory,
            sha: None,
        }
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }
}
