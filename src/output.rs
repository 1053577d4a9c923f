use std::sync::Arc;

use crate::repository::RepositoryRef;
use crate::task::{GeneratorKind, GeneratorTask};
use crate::tree_builder::{FileTree, build_tree_labels};

/// A picked file and its fetched content.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub path: String,
    pub content: Arc<str>,
}

/// Rough estimate: GPT-style token ≈ 4 chars (good enough for UI)
pub fn approx_tokens(s: &str) -> usize {
    s.chars().count() / 4
}

/// The picked files' place in the tree, followed by each file's content.
pub fn render_text(tree: &FileTree, picked: &[PickedFile]) -> String {
    if picked.is_empty() {
        return "(No files selected or matched criteria)\n".to_string();
    }

    let paths: Vec<String> = picked.iter().map(|p| p.path.clone()).collect();
    let mut parts = build_tree_labels(&tree.pruned_to(&paths));
    parts.push(String::new());

    for file in picked {
        parts.push(format!("---\nFile: {}\n---", file.path));
        parts.push(String::new());
        parts.push(file.content.trim_end().to_string());
        parts.push(String::new());
    }

    let mut out = parts.join("\n").trim_end_matches('\n').to_string();
    out.push('\n');
    out
}

/// One task record per picked file, as a pretty JSON array.
pub fn render_tasks(
    kind: GeneratorKind,
    repo: &RepositoryRef,
    picked: &[PickedFile],
) -> serde_json::Result<String> {
    let tasks: Vec<GeneratorTask> = picked
        .iter()
        .map(|p| GeneratorTask::from_selection(kind, repo, &p.path, &p.content))
        .collect();
    let mut out = serde_json::to_string_pretty(&tasks)?;
    out.push('\n');
    Ok(out)
}
