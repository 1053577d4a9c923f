//! Browse a GitHub repository as a tree, highlight files of a target format,
//! and hand picked files to a code generator.

pub mod browser;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod navigator;
pub mod output;
pub mod repository;
pub mod session;
pub mod source;
pub mod task;
pub mod tree_builder;
pub mod tui;
pub mod workflow;

pub use browser::{Browser, BrowserListener, NoopListener, SelectedFile};
pub use error::{BrowseError, Result};
pub use fetcher::ContentFetcher;
pub use format::{TargetFormat, matches_format};
pub use repository::{EntryKind, FlatEntry, RepositoryRef};
pub use source::{GitHubSource, GitHubSourceConfig, MemorySource, RepositorySource};
pub use task::{GeneratorKind, GeneratorTask};
pub use tree_builder::{DirectoryNode, FileNode, FileTree, TreeBuilder, TreeNode, build_tree};
