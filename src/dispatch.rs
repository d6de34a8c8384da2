//! Action execution.
//!
//! Interprets an [`ActionSpec`] and performs the side effect. Everything
//! here is fire-and-forget from the event loop's point of view: spawned
//! processes are detached and never awaited, URL launches go through the
//! detached system handler, and every failure is returned to the caller
//! for status reporting instead of crashing anything.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, instrument};

use crate::store::ActionSpec;

/// Perform the side effect for one action.
#[instrument(name = "dispatch", skip(action), fields(kind = action_kind(action)))]
pub fn dispatch(action: &ActionSpec) -> Result<()> {
    match action {
        ActionSpec::OpenUrl(url) => {
            debug!(url = %url, "Opening URL");
            open::that_detached(url).with_context(|| format!("Failed to open URL: {}", url))
        }
        ActionSpec::RunDetached(cmd) => spawn_detached(cmd),
        ActionSpec::CopyText(text) => copy_to_clipboard(text),
        ActionSpec::RunShell(raw) => spawn_shell(raw),
    }
}

fn action_kind(action: &ActionSpec) -> &'static str {
    match action {
        ActionSpec::OpenUrl(_) => "open-url",
        ActionSpec::RunDetached(_) => "run-detached",
        ActionSpec::CopyText(_) => "copy-text",
        ActionSpec::RunShell(_) => "run-shell",
    }
}

/// Spawn `cmd` as a detached process without shell interpretation: the
/// first whitespace token is the program, the rest are arguments.
fn spawn_detached(cmd: &str) -> Result<()> {
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("Empty command");
    };

    debug!(program, "Spawning detached command");
    let child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn: {}", program))?;

    // Deliberately not awaited; long-running commands must not block the
    // event loop.
    drop(child);
    Ok(())
}

/// Run the whole string through the platform shell, detached.
fn spawn_shell(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        bail!("Empty shell command");
    }

    debug!("Spawning shell command");
    let child = shell_command(raw)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to run shell command: {}", raw))?;
    drop(child);
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn shell_command(raw: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(raw);
    cmd
}

#[cfg(target_os = "windows")]
fn shell_command(raw: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(raw);
    cmd
}

/// Write `text` to the system clipboard. The clipboard handle is opened
/// per call; keeping one alive would hold the selection on some platforms.
fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Failed to open clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to write clipboard")?;
    debug!(bytes = text.len(), "Copied text to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_spawn_rejects_empty_command() {
        assert!(spawn_detached("").is_err());
        assert!(spawn_detached("   ").is_err());
    }

    #[test]
    fn shell_spawn_rejects_empty_command() {
        assert!(spawn_shell("").is_err());
        assert!(spawn_shell("  ").is_err());
    }

    #[test]
    fn detached_spawn_failure_is_an_error_not_a_panic() {
        let result = spawn_detached("keycut-definitely-not-a-real-binary --flag");
        assert!(result.is_err());
    }

    #[test]
    fn detached_spawn_runs_program_with_args() {
        // `true` exists everywhere we run tests
        #[cfg(not(target_os = "windows"))]
        assert!(spawn_detached("true ignored args").is_ok());
    }

    #[test]
    fn shell_spawn_accepts_a_pipeline() {
        #[cfg(not(target_os = "windows"))]
        assert!(spawn_shell("echo hi | cat > /dev/null").is_ok());
    }

    // Clipboard and URL-handler tests touch real system services; they run
    // only with `cargo test --features system-tests`.
    #[cfg(feature = "system-tests")]
    #[test]
    fn copy_action_round_trips_through_clipboard() {
        dispatch(&ActionSpec::CopyText("hello".to_string())).unwrap();
        let mut clipboard = arboard::Clipboard::new().unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "hello");
    }
}
