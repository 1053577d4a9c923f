use super::app_logic::TuiApp;
use super::app_state::{Action, AppMode};
use crate::tree_builder::TreeNode;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;

pub(super) fn handle_events(app: &mut TuiApp, children: &[TreeNode]) -> Result<Option<Action>> {
    if event::poll(Duration::from_millis(50))? {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press {
                return Ok(match app.mode {
                    AppMode::Normal => {
                        let rows = app.visible_rows(children);
                        app.handle_normal_mode_input(key_event, &rows)
                    }
                    AppMode::Filtering => {
                        app.handle_filtering_mode_input(key_event);
                        None
                    }
                });
            }
        }
    }
    Ok(None)
}
