//! Row actions: open a link in the browser, copy text to the clipboard.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose};
use std::io::Write;
use std::process::{Command, Stdio};

/// Open `url` with the platform's default handler.
pub fn open_url(url: &str) -> Result<()> {
    let mut command = opener_command(url);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to open {}", url))?;

    tracing::debug!(url, "opened link");
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

/// Copy `text` to the system clipboard through the terminal (OSC 52).
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(osc52_sequence(text).as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write clipboard sequence")?;
    Ok(())
}

/// OSC 52 "set clipboard" escape carrying base64-encoded text.
fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", general_purpose::STANDARD.encode(text))
}
