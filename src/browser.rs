use std::sync::Arc;

use crate::error::{BrowseError, Result};
use crate::fetcher::ContentFetcher;
use crate::format::TargetFormat;
use crate::navigator::{self, ROOT};
use crate::repository::RepositoryRef;
use crate::source::RepositorySource;
use crate::tree_builder::{FileNode, FileTree, TreeBuilder, TreeNode};

/// Callbacks fired by a `Browser` as the user moves around.
///
/// All methods default to no-ops.
pub trait BrowserListener {
    fn on_directory_selected(&mut self, _path: &str) {}
    fn on_file_selected(&mut self, _file: &FileNode, _content: &str) {}
    fn on_navigation_changed(&mut self, _cursor: &str) {}
}

pub struct NoopListener;

impl BrowserListener for NoopListener {}

/// The file the user committed to, with its content once fetched.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file: FileNode,
    pub content: Option<Arc<str>>,
}

/// One browsing session over one repository.
pub struct Browser<S> {
    repo: RepositoryRef,
    tree: FileTree,
    cursor: String,
    selected: Option<SelectedFile>,
    fetcher: ContentFetcher<S>,
}

impl<S: RepositorySource> Browser<S> {
    /// List `repo` and build its tree.
    pub async fn open(
        source: Arc<S>,
        repo: RepositoryRef,
        target: Option<TargetFormat>,
    ) -> Result<Self> {
        let entries = source.list_repository_tree(&repo).await?;
        log::info!("Listed {} entries from {}", entries.len(), repo);
        let tree = TreeBuilder::new().maybe_target(target).build(&entries);
        let mut fetcher = ContentFetcher::new(source);
        fetcher.switch_repository(&repo);
        Ok(Browser {
            repo,
            tree,
            cursor: ROOT.to_string(),
            selected: None,
            fetcher,
        })
    }

    pub fn repository(&self) -> &RepositoryRef {
        &self.repo
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn target(&self) -> Option<TargetFormat> {
        self.tree.target()
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn fetcher(&self) -> &ContentFetcher<S> {
        &self.fetcher
    }

    /// Nodes under the current cursor.
    pub fn children(&self) -> &[TreeNode] {
        navigator::children_at(self.tree.roots(), &self.cursor)
    }

    /// Move the cursor into the directory at `path`. Returns false (and
    /// leaves the cursor alone) if `path` is not a directory in the tree.
    pub fn open_directory(&mut self, path: &str, listener: &mut dyn BrowserListener) -> bool {
        let Some(next) = self.tree.find(path).and_then(navigator::enter) else {
            log::debug!("Ignoring open of non-directory '{}'", path);
            return false;
        };
        listener.on_directory_selected(&next);
        self.set_cursor(next, listener);
        true
    }

    pub fn go_up(&mut self, listener: &mut dyn BrowserListener) {
        let parent = navigator::up(&self.cursor);
        if parent != self.cursor {
            self.set_cursor(parent, listener);
        }
    }

    fn set_cursor(&mut self, cursor: String, listener: &mut dyn BrowserListener) {
        self.cursor = cursor;
        listener.on_navigation_changed(&self.cursor);
    }

    /// Select the file at `path` and fetch its content.
    ///
    /// The selection replaces any previous one even if the fetch fails, in
    /// which case its content stays empty and the error is returned.
    pub async fn select_file(
        &mut self,
        path: &str,
        listener: &mut dyn BrowserListener,
    ) -> Result<Arc<str>> {
        let file = self
            .tree
            .find(path)
            .and_then(TreeNode::as_file)
            .cloned()
            .ok_or_else(|| BrowseError::NotFound(path.to_string()))?;

        self.selected = Some(SelectedFile {
            file: file.clone(),
            content: None,
        });
        let content = self.fetcher.fetch(&self.repo, &file.path).await?;
        self.selected = Some(SelectedFile {
            file: file.clone(),
            content: Some(Arc::clone(&content)),
        });
        listener.on_file_selected(&file, &content);
        Ok(content)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Change the highlighted format. The selection belongs to the old
    /// format's search and is cleared.
    pub fn set_target_format(&mut self, target: Option<TargetFormat>) {
        if target != self.tree.target() {
            self.tree.retarget(target);
            self.selected = None;
        }
    }

    /// Replace the session with another repository. On failure the current
    /// session is left untouched.
    pub async fn switch_repository(
        &mut self,
        repo: RepositoryRef,
        listener: &mut dyn BrowserListener,
    ) -> Result<()> {
        if repo == self.repo {
            return Ok(());
        }
        let entries = self.fetcher.source().list_repository_tree(&repo).await?;
        self.tree = TreeBuilder::new()
            .maybe_target(self.tree.target())
            .build(&entries);
        self.fetcher.switch_repository(&repo);
        self.repo = repo;
        self.selected = None;
        self.set_cursor(ROOT.to_string(), listener);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl BrowserListener for Recorder {
        fn on_directory_selected(&mut self, path: &str) {
            self.events.push(format!("dir:{path}"));
        }
        fn on_file_selected(&mut self, file: &FileNode, content: &str) {
            self.events.push(format!("file:{}:{}", file.path, content.len()));
        }
        fn on_navigation_changed(&mut self, cursor: &str) {
            self.events.push(format!("nav:{cursor}"));
        }
    }

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme", "flows", "main")
    }

    async fn browser() -> (Arc<MemorySource>, Browser<MemorySource>) {
        let source = Arc::new(
            MemorySource::new()
                .with_file(&repo(), "src/flow.xml", "<flow/>")
                .with_file(&repo(), "src/dwl/transform.dwl", "%dw 2.0")
                .with_file(&repo(), "README.md", "# flows"),
        );
        let browser = Browser::open(Arc::clone(&source), repo(), Some(TargetFormat::DataWeave))
            .await
            .unwrap();
        (source, browser)
    }

    #[tokio::test]
    async fn navigates_and_reports_events() {
        let (_, mut browser) = browser().await;
        let mut rec = Recorder::default();

        assert!(browser.open_directory("src", &mut rec));
        assert!(browser.open_directory("src/dwl", &mut rec));
        assert_eq!(browser.cursor(), "src/dwl");
        assert_eq!(browser.children()[0].name(), "transform.dwl");

        browser.go_up(&mut rec);
        browser.go_up(&mut rec);
        browser.go_up(&mut rec);
        assert_eq!(browser.cursor(), "/");

        assert_eq!(
            rec.events,
            vec!["dir:src", "nav:src", "dir:src/dwl", "nav:src/dwl", "nav:src", "nav:/"]
        );
    }

    #[tokio::test]
    async fn opening_a_file_as_directory_is_ignored() {
        let (_, mut browser) = browser().await;
        assert!(!browser.open_directory("README.md", &mut NoopListener));
        assert!(!browser.open_directory("ghost", &mut NoopListener));
        assert_eq!(browser.cursor(), "/");
    }

    #[tokio::test]
    async fn selecting_a_file_fetches_once() {
        let (source, mut browser) = browser().await;
        let mut rec = Recorder::default();

        browser.select_file("src/dwl/transform.dwl", &mut rec).await.unwrap();
        browser.select_file("src/dwl/transform.dwl", &mut rec).await.unwrap();

        let selected = browser.selected().unwrap();
        assert!(selected.file.matches_target);
        assert_eq!(selected.content.as_deref(), Some("%dw 2.0"));
        assert_eq!(source.read_count(&repo(), "src/dwl/transform.dwl"), 1);
        assert_eq!(rec.events.len(), 2);
    }

    #[tokio::test]
    async fn selecting_a_path_missing_from_the_tree_fails() {
        let (_, mut browser) = browser().await;
        let err = browser.select_file("src", &mut NoopListener).await.unwrap_err();
        assert_eq!(err, BrowseError::NotFound("src".to_string()));
        assert!(browser.selected().is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_an_empty_selection() {
        let (source, mut browser) = browser().await;
        source.fail_with(Some(BrowseError::Network("offline".into())));
        assert!(browser.select_file("README.md", &mut NoopListener).await.is_err());
        let selected = browser.selected().unwrap();
        assert_eq!(selected.file.path, "README.md");
        assert!(selected.content.is_none());
    }

    #[tokio::test]
    async fn changing_format_rehighlights_and_clears_selection() {
        let (_, mut browser) = browser().await;
        browser.select_file("src/flow.xml", &mut NoopListener).await.unwrap();
        browser.set_target_format(Some(TargetFormat::Xml));
        assert!(browser.selected().is_none());
        let matching: Vec<_> = browser
            .tree()
            .matching_files()
            .iter()
            .map(|f| f.path.clone())
            .collect();
        assert_eq!(matching, vec!["src/flow.xml".to_string()]);
    }

    #[tokio::test]
    async fn switching_repository_resets_the_session() {
        let other = RepositoryRef::new("acme", "other", "main");
        let source = Arc::new(
            MemorySource::new()
                .with_file(&repo(), "a/x.json", "{}")
                .with_file(&other, "x.json", "[]"),
        );
        let mut browser = Browser::open(Arc::clone(&source), repo(), None).await.unwrap();
        browser.open_directory("a", &mut NoopListener);
        browser.select_file("a/x.json", &mut NoopListener).await.unwrap();

        browser.switch_repository(other.clone(), &mut NoopListener).await.unwrap();
        assert_eq!(browser.repository(), &other);
        assert_eq!(browser.cursor(), "/");
        assert!(browser.selected().is_none());
        assert_eq!(browser.fetcher().cached_len(), 0);
    }

    #[tokio::test]
    async fn failed_switch_keeps_the_current_session() {
        let (_, mut browser) = browser().await;
        let missing = RepositoryRef::new("acme", "missing", "main");
        assert!(browser.switch_repository(missing, &mut NoopListener).await.is_err());
        assert_eq!(browser.repository(), &repo());
        assert_eq!(browser.tree().roots().len(), 2);
    }
}
