#[cfg(target_os = "linux")]
use anyhow::Context;
use anyhow::Result;
use arboard::Clipboard;

/// Hidden argument that turns the process into a clipboard holder.
pub const DAEMON_FLAG: &str = "__repopick_clipboard_daemon";

/// On Linux the clipboard is owned by a process, so the text is handed to a
/// detached copy of this binary that keeps serving it after we exit.
#[cfg(target_os = "linux")]
fn serve_clipboard_forever() -> Result<()> {
    use arboard::SetExtLinux;

    let text = std::io::read_to_string(std::io::stdin()).context("reading clipboard text")?;
    let mut clipboard = Clipboard::new()?;
    // `wait` blocks until another application takes ownership.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard holder if `DAEMON_FLAG` was passed.
/// Returns Ok(true) when it ran, in which case the caller should exit.
pub fn run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    serve_clipboard_forever()?;
    #[cfg(not(target_os = "linux"))]
    log::warn!("{} is only used on Linux; ignoring", DAEMON_FLAG);
    Ok(true)
}

pub fn copy_text(text: &str) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()
            .context("starting clipboard holder")?;

        let mut stdin = child
            .stdin
            .take()
            .context("clipboard holder has no stdin")?;
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        log::debug!("Handed {} bytes to clipboard holder {}", text.len(), child.id());
    }
    Ok(())
}
