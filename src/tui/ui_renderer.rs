use super::app_logic::TuiApp;
use super::app_state::{AppMode, NoticeKind};
use crate::browser::Browser;
use crate::navigator;
use crate::source::RepositorySource;
use crate::tree_builder::TreeNode;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

const PREVIEW_MAX_LINES: usize = 500;

fn draw_help_block(f: &mut Frame, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav | Enter/l: Open/Load | Backspace/h: Up | Space: Pick | y: Confirm | q: Quit"),
        Line::from("/: Filter | m: Matching only | f: Next format | p: Preview | r: Retry fetch"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Repopick Repository Browser"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_filter_input_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let input_text = format!("/{}", app.filter_input);
    let filter_paragraph = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter (Esc to cancel, Enter to apply)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(filter_paragraph, area);
    let cursor_col = app.filter_input[..app.filter_cursor_pos].chars().count() as u16;
    f.set_cursor_position((area.x + 1 + cursor_col + 1, area.y + 1));
}

fn list_title<S: RepositorySource>(app: &TuiApp, browser: &Browser<S>) -> String {
    let crumbs = navigator::breadcrumbs(browser.cursor()).join(" › ");
    let format = browser
        .target()
        .map(|f| f.label())
        .unwrap_or("no format");
    let mut title = format!("{} {} [{}]", browser.repository(), crumbs, format);
    if app.matching_only {
        title.push_str(" (matching only)");
    }
    if !app.filter_input.is_empty() && app.mode == AppMode::Normal {
        title.push_str(&format!(" (Filter: '{}')", app.filter_input));
    }
    title
}

fn row_item<'a>(app: &TuiApp, node: &'a TreeNode) -> ListItem<'a> {
    match node {
        TreeNode::Directory(dir) => ListItem::new(format!("[+] {}/", dir.name))
            .style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)),
        TreeNode::File(file) => {
            let pick_prefix = if app.is_picked(&file.path) { "[x] " } else { "[ ] " };
            let item = ListItem::new(format!("{}{}", pick_prefix, file.name));
            if file.matches_target {
                item.style(Style::default().fg(Color::Green))
            } else {
                item
            }
        }
    }
}

fn draw_main_list_block<S: RepositorySource>(
    f: &mut Frame,
    app: &mut TuiApp,
    browser: &Browser<S>,
    area: Rect,
) {
    let rows = app.visible_rows(browser.children());
    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    app.ensure_selection_is_visible_in_viewport(rows.len());

    let end = (app.scroll_offset + app.list_viewport_height).min(rows.len());
    let list_items: Vec<ListItem> = rows
        .get(app.scroll_offset..end)
        .unwrap_or(&[])
        .iter()
        .map(|node| row_item(app, node))
        .collect();

    let empty = list_items.is_empty();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(list_title(app, browser));
    if empty {
        f.render_widget(Paragraph::new("No files found").block(block), area);
        return;
    }

    let list_widget = List::new(list_items)
        .block(block)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state_for_view = ratatui::widgets::ListState::default();
    list_state_for_view.select(Some(app.current_selection_idx - app.scroll_offset));
    f.render_stateful_widget(list_widget, area, &mut list_state_for_view);
}

fn draw_preview_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let (title, body) = match &app.preview {
        Some(file) => (
            format!("Preview: {}", file.path),
            file.content
                .lines()
                .take(PREVIEW_MAX_LINES)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        None => ("Preview".to_string(), "Select a file to load it".to_string()),
    };
    let paragraph = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, app: &TuiApp, area: Rect) {
    let (text, style) = match &app.notice {
        Some(notice) if notice.kind == NoticeKind::Error => {
            (notice.text.clone(), Style::default().fg(Color::Red))
        }
        Some(notice) => (notice.text.clone(), Style::default().fg(Color::Gray)),
        None => (
            format!("{} picked", app.picked.len()),
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

pub(super) fn ui_frame<S: RepositorySource>(
    frame: &mut Frame,
    app: &mut TuiApp,
    browser: &Browser<S>,
) {
    let help_lines = 2;
    let filter_input_height = if app.mode == AppMode::Filtering { 3 } else { 0 };
    let top_block_container_height = (help_lines + 2) + filter_input_height;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(top_block_container_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let top_content_constraints = if app.mode == AppMode::Filtering {
        vec![
            Constraint::Length(help_lines + 2),
            Constraint::Length(filter_input_height),
        ]
    } else {
        vec![Constraint::Length(help_lines + 2)]
    };
    let top_content_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(top_content_constraints)
        .split(main_chunks[0]);

    draw_help_block(frame, top_content_chunks[0]);
    if app.mode == AppMode::Filtering {
        draw_filter_input_block(frame, app, top_content_chunks[1]);
    }

    if app.preview_open {
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(main_chunks[1]);
        draw_main_list_block(frame, app, browser, body_chunks[0]);
        draw_preview_block(frame, app, body_chunks[1]);
    } else {
        draw_main_list_block(frame, app, browser, main_chunks[1]);
    }

    draw_status_line(frame, app, main_chunks[2]);
}
