//! Structured JSONL logging plus the user-facing status line.
//!
//! Dual-output logging:
//! - **JSONL to file** (~/.config/keycut/logs/keycut.jsonl) - structured, machine-parseable
//! - **Pretty to stderr** - human-readable for developers
//!
//! A small in-memory ring of recent status messages is kept for whatever
//! surface renders the status bar. `status()` feeds both the ring and the
//! tracing pipeline.
//!
//! # Usage
//!
//! ```rust,ignore
//! use keycut::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! logging::status("Saved 3 hotkeys");
//! ```

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static STATUS_RING: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_STATUS_LINES: usize = 50;

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// Dropping the guard will flush remaining logs and close the file.
pub fn init() -> LoggingGuard {
    let _ = STATUS_RING.set(Mutex::new(VecDeque::with_capacity(MAX_STATUS_LINES)));

    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join("keycut.jsonl");

    // Open log file with append mode
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .expect("Failed to open /dev/null")
        });

    // Non-blocking writer so slow disks never stall the event loop
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the log directory path (~/.config/keycut/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".config").join("keycut").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("keycut-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join("keycut.jsonl")
}

/// Record a user-visible status message.
///
/// The message lands in the status ring (for the status-bar surface) and in
/// the structured log.
pub fn status(message: &str) {
    if let Some(ring) = STATUS_RING.get() {
        if let Ok(mut buf) = ring.lock() {
            if buf.len() >= MAX_STATUS_LINES {
                buf.pop_front();
            }
            buf.push_back(message.to_string());
        }
    }
    tracing::info!(status = true, "{}", message);
}

/// Recent status messages, oldest first.
pub fn recent_status() -> Vec<String> {
    if let Some(ring) = STATUS_RING.get() {
        if let Ok(buf) = ring.lock() {
            return buf.iter().cloned().collect();
        }
    }
    Vec::new()
}

/// The most recent status message, if any.
pub fn last_status() -> Option<String> {
    recent_status().pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ring_is_bounded_and_keeps_newest() {
        let _ = STATUS_RING.set(Mutex::new(VecDeque::with_capacity(MAX_STATUS_LINES)));
        for i in 0..(MAX_STATUS_LINES + 10) {
            status(&format!("ring test message {}", i));
        }
        let recent = recent_status();
        // Other tests may interleave their own status lines; only assert the
        // bound and that our newest message survived eviction.
        assert!(recent.len() <= MAX_STATUS_LINES);
        let newest = format!("ring test message {}", MAX_STATUS_LINES + 9);
        assert!(recent.iter().any(|m| m == &newest));
    }

    #[test]
    fn log_path_ends_with_jsonl() {
        assert!(log_path().to_string_lossy().ends_with("keycut.jsonl"));
    }
}
