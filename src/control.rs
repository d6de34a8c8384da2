//! External control via stdin.
//!
//! The engine is headless; whatever surface embeds it (or a test harness)
//! drives the search session and the edit flows by writing JSONL commands
//! to stdin, one JSON object per line:
//!
//! ```json
//! {"type": "openSearch"}
//! {"type": "setQuery", "text": "reload"}
//! {"type": "moveDown"}
//! {"type": "confirm"}
//! {"type": "escape"}
//! {"type": "select", "index": 2}
//! {"type": "add", "window": "Firefox", "hotkey": "ctrl+r", "description": "reload", "action": "cmd:xdotool key F5"}
//! {"type": "edit", "index": 0, "window": "", "hotkey": "ctrl+r", "description": "reload", "action": "cmd:xdotool key F5"}
//! {"type": "remove", "index": 0}
//! {"type": "save"}
//! {"type": "currentWindow"}
//! ```
//!
//! Malformed lines are logged and skipped; the listener never takes the
//! process down.

use serde::Deserialize;
use tracing::{debug, warn};

/// Commands an embedding surface can send over stdin.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlCommand {
    /// Open the search popup session (same path as the open-search shortcut)
    OpenSearch,
    /// Replace the live query of the open session
    SetQuery { text: String },
    MoveDown,
    MoveUp,
    /// Confirm the highlighted entry and dispatch its action
    Confirm,
    /// Close the session with no dispatch
    Escape,
    /// Pointer-equivalent selection of an entry by index
    Select { index: usize },
    /// Add a hotkey definition
    Add {
        #[serde(default)]
        window: String,
        hotkey: String,
        description: String,
        action: String,
    },
    /// Replace the definition at `index` wholesale
    Edit {
        index: usize,
        #[serde(default)]
        window: String,
        hotkey: String,
        description: String,
        action: String,
    },
    /// Delete the definition at `index`
    Remove { index: usize },
    /// Explicit save trigger
    Save,
    /// Report the current window identifier as a status line
    CurrentWindow,
}

/// Start a thread that reads stdin line-by-line for JSONL commands.
///
/// Uses a bounded channel; stdin commands arrive far slower than the
/// event loop drains them. When the receiver is dropped the thread exits.
pub fn start_stdin_listener() -> async_channel::Receiver<ControlCommand> {
    use std::io::BufRead;

    let (tx, rx) = async_channel::bounded(100);

    std::thread::spawn(move || {
        debug!("Control listener started");
        let stdin = std::io::stdin();
        let reader = stdin.lock();

        for line in reader.lines() {
            match line {
                Ok(line) if !line.trim().is_empty() => {
                    match serde_json::from_str::<ControlCommand>(&line) {
                        Ok(command) => {
                            debug!(?command, "Control command received");
                            if tx.send_blocking(command).is_err() {
                                debug!("Control channel closed, exiting");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, line = %line, "Unparsable control command");
                        }
                    }
                }
                Ok(_) => {} // Empty line, ignore
                Err(e) => {
                    warn!(error = %e, "Error reading stdin");
                    break;
                }
            }
        }
        debug!("Control listener exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_jsonl() {
        let cmd: ControlCommand = serde_json::from_str(r#"{"type": "openSearch"}"#).unwrap();
        assert!(matches!(cmd, ControlCommand::OpenSearch));

        let cmd: ControlCommand =
            serde_json::from_str(r#"{"type": "setQuery", "text": "reload"}"#).unwrap();
        assert!(matches!(cmd, ControlCommand::SetQuery { text } if text == "reload"));

        let cmd: ControlCommand =
            serde_json::from_str(r#"{"type": "select", "index": 2}"#).unwrap();
        assert!(matches!(cmd, ControlCommand::Select { index: 2 }));
    }

    #[test]
    fn add_defaults_window_to_global() {
        let cmd: ControlCommand = serde_json::from_str(
            r#"{"type": "add", "hotkey": "ctrl+r", "description": "reload", "action": "cmd:true"}"#,
        )
        .unwrap();
        match cmd {
            ControlCommand::Add { window, hotkey, .. } => {
                assert_eq!(window, "");
                assert_eq!(hotkey, "ctrl+r");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        assert!(serde_json::from_str::<ControlCommand>(r#"{"type": "selfDestruct"}"#).is_err());
    }
}
