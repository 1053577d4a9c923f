use crate::browser::{Browser, BrowserListener};
use crate::cli::{Cli, Emit};
use crate::config::{self, Overrides, Settings};
use crate::output::{self, PickedFile};
use crate::repository::RepositoryRef;
use crate::session::SessionStore;
use crate::source::{GitHubSource, RepositorySource};
use crate::tree_builder::{DirectoryNode, FileNode, FileTree, TreeNode, build_tree_labels};
use crate::{clipboard, navigator, tui};
use anyhow::{Context, Result, anyhow, bail};
use glob::Pattern;
use std::sync::Arc;

/// Logs fetches made without the TUI.
struct LogListener;

impl BrowserListener for LogListener {
    fn on_file_selected(&mut self, file: &FileNode, content: &str) {
        log::debug!("Fetched {} ({} bytes)", file.path, content.len());
    }
}

// The repository on the command line, or else the one remembered from the
// previous run.
fn resolve_repository(cli_args: &Cli, session: Option<&SessionStore>) -> Result<RepositoryRef> {
    if let Some(raw) = &cli_args.repository {
        return raw.parse().map_err(|e| anyhow!("{e}"));
    }
    session
        .and_then(|store| store.load().last_repository)
        .inspect(|repo| log::info!("Reopening last repository {}", repo))
        .context("No repository given and none remembered; pass owner/name[@branch]")
}

fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|s| Pattern::new(s).with_context(|| format!("Invalid --pick glob pattern '{s}'")))
        .collect()
}

/// Paths of the files a headless pick should fetch, in tree order.
fn select_paths(tree: &FileTree, patterns: &[Pattern], matching_only: bool) -> Vec<String> {
    tree.files()
        .into_iter()
        .filter(|file| !matching_only || file.matches_target)
        .filter(|file| patterns.iter().any(|p| p.matches(&file.path)))
        .map(|file| file.path.clone())
        .collect()
}

/// One line per entry under `cursor`; matching files are marked with `*`.
fn listing_lines(tree: &FileTree, cursor: &str, matching_only: bool) -> Vec<String> {
    let shallow: Vec<TreeNode> = navigator::children_at(tree.roots(), cursor)
        .iter()
        .filter(|node| match node {
            TreeNode::File(file) => !matching_only || file.matches_target,
            TreeNode::Directory(_) => true,
        })
        .map(|node| match node {
            TreeNode::Directory(dir) => TreeNode::Directory(DirectoryNode {
                name: dir.name.clone(),
                path: dir.path.clone(),
                children: Vec::new(),
            }),
            TreeNode::File(file) => TreeNode::File(file.clone()),
        })
        .collect();

    if shallow.is_empty() {
        return vec![cursor.to_string(), "(no files found)".to_string()];
    }

    let mut lines = build_tree_labels(&shallow);
    lines[0] = cursor.to_string();
    for (line, node) in lines.iter_mut().skip(1).zip(&shallow) {
        if matches!(node, TreeNode::File(f) if f.matches_target) {
            line.push_str(" *");
        }
    }
    lines
}

async fn pick_headless<S: RepositorySource>(
    browser: &mut Browser<S>,
    patterns: &[Pattern],
    matching_only: bool,
) -> Vec<PickedFile> {
    let paths = select_paths(browser.tree(), patterns, matching_only);
    let mut picked = Vec::with_capacity(paths.len());
    for path in paths {
        match browser.select_file(&path, &mut LogListener).await {
            Ok(content) => picked.push(PickedFile { path, content }),
            Err(e) => log::warn!("Skipping {}: {}", path, e.user_message()),
        }
    }
    picked
}

// Performs the final action: printing for dry-run or copying to clipboard.
fn perform_final_action(output_string: &str, file_count: usize, is_dry_run: bool) -> Result<()> {
    let tokens = output::approx_tokens(output_string);
    if is_dry_run {
        print!("{}", output_string);
        println!(
            "(Dry run: Would copy {} files (≈ {} tokens). Clipboard not affected.)",
            file_count, tokens
        );
    } else {
        clipboard::copy_text(output_string)?;
        println!(
            "✅ Copied {} files (≈ {} tokens) to the clipboard.",
            file_count, tokens
        );
    }
    Ok(())
}

// Main orchestrator for the repopick application logic.
pub fn run_repopick(cli_args: Cli) -> Result<()> {
    let file_config = config::load(cli_args.config.as_deref())?;
    let settings = Settings::resolve(
        &file_config,
        Overrides {
            token: cli_args.token.clone(),
            api_url: cli_args.api_url.clone(),
            format: cli_args.format,
            generator: cli_args.generator,
        },
    )?;

    let generator = match (cli_args.emit, settings.generator) {
        (Emit::Task, None) => {
            bail!("--emit task needs --generator (or default_generator in the config file)")
        }
        (_, generator) => generator,
    };
    let patterns = compile_patterns(&cli_args.pick)?;

    let session = SessionStore::default_location();
    let repo = resolve_repository(&cli_args, session.as_ref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let source = Arc::new(GitHubSource::new(settings.source.clone())?);
    let mut browser = runtime
        .block_on(Browser::open(source, repo.clone(), settings.format))
        .map_err(|e| anyhow!("{}: {}", repo, e.user_message()))?;

    if let Some(store) = &session {
        if let Err(e) = store.remember_repository(&repo) {
            log::warn!("Could not save session to {}: {}", store.path().display(), e);
        }
    }

    // Step 1: listing only.
    if let Some(cursor) = &cli_args.list {
        for line in listing_lines(browser.tree(), cursor, cli_args.matching_only) {
            println!("{line}");
        }
        return Ok(());
    }

    // Step 2: headless pick or interactive browsing.
    let picked = if !patterns.is_empty() {
        runtime.block_on(pick_headless(&mut browser, &patterns, cli_args.matching_only))
    } else {
        match tui::run_browser(&mut browser, &runtime)? {
            Some(picked) => picked,
            None => {
                println!("Selection cancelled. Exiting.");
                return Ok(());
            }
        }
    };

    if picked.is_empty() && !cli_args.dry_run {
        bail!("No files selected or matched criteria to copy.");
    }

    // Step 3: render and hand off.
    let output_string = match (cli_args.emit, generator) {
        (Emit::Task, Some(kind)) => output::render_tasks(kind, browser.repository(), &picked)?,
        _ => output::render_text(browser.tree(), &picked),
    };
    perform_final_action(&output_string, picked.len(), cli_args.dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TargetFormat;
    use crate::repository::FlatEntry;
    use crate::source::MemorySource;
    use crate::tree_builder::TreeBuilder;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme", "flows", "main")
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new()
                .with_file(&repo(), "src/flow.xml", "<flow/>")
                .with_file(&repo(), "src/dwl/transform.dwl", "%dw 2.0")
                .with_file(&repo(), "src/dwl/helpers.dwl", "fun f() = 1")
                .with_file(&repo(), "README.md", "# flows"),
        )
    }

    #[test]
    fn lists_one_level_with_match_markers() {
        let tree = TreeBuilder::new()
            .target(TargetFormat::Xml)
            .build(&[FlatEntry::file("src/flow.xml"), FlatEntry::file("src/dwl/a.dwl")]);
        assert_eq!(listing_lines(&tree, "src", false), vec!["src", "├─ dwl/", "└─ flow.xml *"]);
        assert_eq!(listing_lines(&tree, "src/dwl", true), vec!["src/dwl", "(no files found)"]);
        assert_eq!(listing_lines(&tree, "missing", false), vec!["missing", "(no files found)"]);
    }

    #[tokio::test]
    async fn headless_pick_fetches_glob_matches() {
        let source = source();
        let mut browser = Browser::open(Arc::clone(&source), repo(), Some(TargetFormat::DataWeave))
            .await
            .unwrap();
        let patterns = compile_patterns(&["src/**/*.dwl".to_string()]).unwrap();

        let picked = pick_headless(&mut browser, &patterns, false).await;
        let paths: Vec<&str> = picked.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["src/dwl/helpers.dwl", "src/dwl/transform.dwl"]);
        assert_eq!(source.read_count(&repo(), "src/dwl/transform.dwl"), 1);
        assert_eq!(source.read_count(&repo(), "README.md"), 0);
    }

    #[tokio::test]
    async fn matching_only_filters_picks_by_format() {
        let mut browser = Browser::open(source(), repo(), Some(TargetFormat::Xml))
            .await
            .unwrap();
        let patterns = compile_patterns(&["**/*".to_string()]).unwrap();
        let picked = pick_headless(&mut browser, &patterns, true).await;
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].path, "src/flow.xml");
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(compile_patterns(&["src/[".to_string()]).is_err());
    }

    #[test]
    fn repository_comes_from_args_then_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let cli = Cli::try_parse_from(["repopick"]).unwrap();
        assert!(resolve_repository(&cli, Some(&store)).is_err());

        store.remember_repository(&repo()).unwrap();
        assert_eq!(resolve_repository(&cli, Some(&store)).unwrap(), repo());

        let cli = Cli::try_parse_from(["repopick", "other/repo@dev"]).unwrap();
        assert_eq!(
            resolve_repository(&cli, Some(&store)).unwrap(),
            RepositoryRef::new("other", "repo", "dev")
        );
    }
}
