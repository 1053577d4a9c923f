mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use self::run_tui::run_browser;

// The main TUI loop and terminal setup/teardown
mod run_tui {
    use super::app_logic::TuiApp;
    use super::app_state::Action;
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use crate::browser::Browser;
    use crate::format::TargetFormat;
    use crate::output::PickedFile;
    use crate::source::RepositorySource;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use std::io::{self, Stdout};
    use tokio::runtime::Runtime;

    /// Browse interactively. Returns the confirmed files, or `None` if the
    /// user quit without confirming.
    pub fn run_browser<S: RepositorySource>(
        browser: &mut Browser<S>,
        runtime: &Runtime,
    ) -> Result<Option<Vec<PickedFile>>> {
        let mut app = TuiApp::new();
        let mut terminal = init_terminal()?;

        let outcome = event_loop(&mut terminal, &mut app, browser, runtime);
        restore_terminal(terminal)?;
        outcome?;

        if app.confirmed {
            Ok(Some(app.into_picked()))
        } else {
            Ok(None)
        }
    }

    fn event_loop<S: RepositorySource>(
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        app: &mut TuiApp,
        browser: &mut Browser<S>,
        runtime: &Runtime,
    ) -> Result<()> {
        while !app.quit {
            terminal.draw(|frame| ui_frame(frame, app, browser))?;
            if let Some(action) = handle_events(app, browser.children())? {
                if needs_fetch(&action) {
                    app.set_info("Loading…");
                    terminal.draw(|frame| ui_frame(frame, app, browser))?;
                }
                apply_action(action, app, browser, runtime);
            }
        }
        Ok(())
    }

    fn needs_fetch(action: &Action) -> bool {
        matches!(
            action,
            Action::SelectFile(_) | Action::TogglePick(_) | Action::Retry(_)
        )
    }

    /// Run one action against the browser. Failures end up in the status
    /// line; the user retries by repeating the action.
    fn apply_action<S: RepositorySource>(
        action: Action,
        app: &mut TuiApp,
        browser: &mut Browser<S>,
        runtime: &Runtime,
    ) {
        match action {
            Action::OpenDirectory(path) => {
                browser.open_directory(&path, app);
            }
            Action::GoUp => browser.go_up(app),
            Action::SelectFile(path) | Action::Retry(path) => {
                if let Err(e) = runtime.block_on(browser.select_file(&path, app)) {
                    app.record_failure(&path, &e);
                }
            }
            Action::TogglePick(path) => {
                if app.unpick(&path) {
                    app.set_info(format!("Unpicked {path}"));
                    return;
                }
                match runtime.block_on(browser.select_file(&path, app)) {
                    Ok(content) => {
                        app.pick(&path, content);
                        app.set_info(format!("Picked {path}"));
                    }
                    Err(e) => app.record_failure(&path, &e),
                }
            }
            Action::CycleFormat => {
                let next = browser
                    .target()
                    .map(TargetFormat::next)
                    .unwrap_or(TargetFormat::Json);
                browser.set_target_format(Some(next));
                app.preview = None;
                app.set_info(format!("Highlighting {next} files"));
            }
        }
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
