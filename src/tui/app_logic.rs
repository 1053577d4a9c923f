use super::app_state::{Action, AppMode, Notice, NoticeKind};
use crate::browser::BrowserListener;
use crate::error::BrowseError;
use crate::output::{PickedFile, approx_tokens};
use crate::tree_builder::{FileNode, TreeNode};
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;

pub struct TuiApp {
    pub(super) current_selection_idx: usize,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) confirmed: bool,
    pub(super) mode: AppMode,
    pub(super) filter_input: String,
    pub(super) filter_cursor_pos: usize,
    pub(super) list_viewport_height: usize,
    pub(super) matching_only: bool,
    pub(super) preview_open: bool,
    pub(super) preview: Option<PickedFile>,
    pub(super) picked: Vec<PickedFile>,
    pub(super) notice: Option<Notice>,
    pub(super) failed_path: Option<String>,
}

impl TuiApp {
    pub fn new() -> Self {
        TuiApp {
            current_selection_idx: 0,
            scroll_offset: 0,
            quit: false,
            confirmed: false,
            mode: AppMode::Normal,
            filter_input: String::new(),
            filter_cursor_pos: 0,
            list_viewport_height: 0, // Will be updated by ui_renderer
            matching_only: false,
            preview_open: true,
            preview: None,
            picked: Vec::new(),
            notice: None,
            failed_path: None,
        }
    }

    /// The rows shown for `children` after the name filter and the
    /// matching-only toggle. Directories survive the toggle so the user can
    /// still reach nested matches.
    pub(super) fn visible_rows<'a>(&self, children: &'a [TreeNode]) -> Vec<&'a TreeNode> {
        let lower_filter = self.filter_input.to_lowercase();
        children
            .iter()
            .filter(|node| match node {
                TreeNode::Directory(_) => true,
                TreeNode::File(file) => !self.matching_only || file.matches_target,
            })
            .filter(|node| {
                lower_filter.is_empty() || node.name().to_lowercase().contains(&lower_filter)
            })
            .collect()
    }

    pub(super) fn move_selection(&mut self, delta: i32, row_count: usize) {
        if row_count == 0 {
            self.current_selection_idx = 0;
            return;
        }
        let current = self.current_selection_idx.min(row_count - 1) as i32;
        self.current_selection_idx = (current + delta).rem_euclid(row_count as i32) as usize;
    }

    pub(super) fn clamp_selection(&mut self, row_count: usize) {
        if row_count == 0 {
            self.current_selection_idx = 0;
        } else if self.current_selection_idx >= row_count {
            self.current_selection_idx = row_count - 1;
        }
    }

    pub(super) fn ensure_selection_is_visible_in_viewport(&mut self, row_count: usize) {
        self.clamp_selection(row_count);
        let list_height = self.list_viewport_height;
        if list_height == 0 || row_count <= list_height {
            self.scroll_offset = 0;
            return;
        }
        let pos = self.current_selection_idx;
        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + list_height {
            self.scroll_offset = pos + 1 - list_height;
        }
        self.scroll_offset = self.scroll_offset.min(row_count - list_height);
    }

    pub(super) fn is_picked(&self, path: &str) -> bool {
        self.picked.iter().any(|p| p.path == path)
    }

    /// Remove `path` from the picks if present. Returns whether it was.
    pub(super) fn unpick(&mut self, path: &str) -> bool {
        let before = self.picked.len();
        self.picked.retain(|p| p.path != path);
        before != self.picked.len()
    }

    pub(super) fn pick(&mut self, path: &str, content: Arc<str>) {
        if !self.is_picked(path) {
            self.picked.push(PickedFile {
                path: path.to_string(),
                content,
            });
        }
    }

    pub(super) fn set_info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        });
    }

    pub(super) fn record_failure(&mut self, path: &str, err: &BrowseError) {
        log::warn!("Fetching {} failed: {}", path, err);
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            text: err.user_message(),
        });
        self.failed_path = Some(path.to_string());
    }

    /// Files confirmed by the user: the picks, or else the previewed file.
    pub fn into_picked(self) -> Vec<PickedFile> {
        if self.picked.is_empty() {
            self.preview.into_iter().collect()
        } else {
            self.picked
        }
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_normal_mode_input(
        &mut self,
        key_event: KeyEvent,
        rows: &[&TreeNode],
    ) -> Option<Action> {
        let current = rows.get(self.current_selection_idx).copied();
        match key_event.code {
            KeyCode::Char('/') => {
                self.mode = AppMode::Filtering;
                None
            }
            KeyCode::Char('q') => {
                self.quit = true;
                None
            }
            KeyCode::Esc => {
                if !self.filter_input.is_empty() {
                    self.filter_input.clear();
                    self.filter_cursor_pos = 0;
                } else {
                    self.quit = true;
                }
                None
            }
            KeyCode::Char('y') => {
                self.confirmed = true;
                self.quit = true;
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1, rows.len());
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1, rows.len());
                None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.current_selection_idx = 0;
                None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.current_selection_idx = rows.len().saturating_sub(1);
                None
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => match current? {
                TreeNode::Directory(dir) => Some(Action::OpenDirectory(dir.path.clone())),
                TreeNode::File(file) => Some(Action::SelectFile(file.path.clone())),
            },
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => Some(Action::GoUp),
            KeyCode::Char(' ') => match current? {
                TreeNode::File(file) => Some(Action::TogglePick(file.path.clone())),
                TreeNode::Directory(_) => None,
            },
            KeyCode::Char('p') => {
                self.preview_open = !self.preview_open;
                None
            }
            KeyCode::Char('m') => {
                self.matching_only = !self.matching_only;
                self.current_selection_idx = 0;
                None
            }
            KeyCode::Char('f') => Some(Action::CycleFormat),
            KeyCode::Char('r') => self.failed_path.clone().map(Action::Retry),
            _ => None,
        }
    }

    pub(super) fn handle_filtering_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.filter_input.clear();
                self.filter_cursor_pos = 0;
            }
            KeyCode::Char(c) => {
                self.filter_input.insert(self.filter_cursor_pos, c);
                self.filter_cursor_pos += c.len_utf8();
                self.current_selection_idx = 0;
            }
            KeyCode::Backspace => {
                if let Some((idx, _)) = self.filter_input[..self.filter_cursor_pos]
                    .char_indices()
                    .next_back()
                {
                    self.filter_input.remove(idx);
                    self.filter_cursor_pos = idx;
                    self.current_selection_idx = 0;
                }
            }
            KeyCode::Left => {
                if let Some((idx, _)) = self.filter_input[..self.filter_cursor_pos]
                    .char_indices()
                    .next_back()
                {
                    self.filter_cursor_pos = idx;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.filter_input[self.filter_cursor_pos..].chars().next() {
                    self.filter_cursor_pos += c.len_utf8();
                }
            }
            _ => {}
        }
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserListener for TuiApp {
    fn on_directory_selected(&mut self, _path: &str) {
        self.notice = None;
    }

    fn on_file_selected(&mut self, file: &FileNode, content: &str) {
        self.set_info(format!(
            "Loaded {} (≈ {} tokens)",
            file.path,
            approx_tokens(content)
        ));
        self.failed_path = None;
        self.preview = Some(PickedFile {
            path: file.path.clone(),
            content: Arc::from(content),
        });
    }

    fn on_navigation_changed(&mut self, _cursor: &str) {
        self.current_selection_idx = 0;
        self.scroll_offset = 0;
        self.filter_input.clear();
        self.filter_cursor_pos = 0;
    }
}
