//! Foreground window tracking.
//!
//! A background thread polls the platform window query once per interval
//! and replaces the shared context identifier wholesale. Failures are
//! silent: the previous value is retained and the loop tries again next
//! cycle. The tracker is the only writer; everyone else reads through
//! [`WindowContext::get`].
//!
//! Stopping is cooperative - a flag checked once per iteration, so the
//! loop exits within one polling interval of [`WindowTracker::stop`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::matcher::UNKNOWN_WINDOW;
use crate::platform::WindowQuery;

/// The shared current-window cell.
///
/// Atomically replaced by the tracker thread, read by the matcher and the
/// UI surface. Never partially mutated.
#[derive(Debug, Clone)]
pub struct WindowContext {
    inner: Arc<RwLock<String>>,
}

impl WindowContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(UNKNOWN_WINDOW.to_string())),
        }
    }

    /// Current window identifier (`"Unknown"` until the first successful
    /// query).
    pub fn get(&self) -> String {
        self.inner.read().clone()
    }

    /// Wholesale replacement. Tracker-only; there is exactly one writer.
    pub(crate) fn replace(&self, identifier: String) {
        *self.inner.write() = identifier;
    }
}

impl Default for WindowContext {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED_CONTEXT: LazyLock<WindowContext> = LazyLock::new(WindowContext::new);

/// The process-wide context cell used by the running application.
/// Tests construct their own [`WindowContext`] instances instead.
pub fn shared_context() -> WindowContext {
    SHARED_CONTEXT.clone()
}

/// Reduce a raw window title to the identifier used for scope matching:
/// the first whitespace-separated token when the title contains spaces,
/// the whole title otherwise.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_whitespace().next() {
        Some(first) => first.to_string(),
        None => UNKNOWN_WINDOW.to_string(),
    }
}

/// Background polling loop over a [`WindowQuery`].
pub struct WindowTracker {
    running: Arc<AtomicBool>,
    interval: Duration,
}

impl WindowTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            interval,
        }
    }

    /// Start the polling thread.
    ///
    /// `notify` is invoked after every attempt, success or failure, so the
    /// UI context can refresh its label; it must be cheap and must not
    /// block. Returns `None` if the tracker is already running.
    pub fn start(
        &self,
        query: Box<dyn WindowQuery + Send>,
        context: WindowContext,
        notify: impl Fn() + Send + 'static,
    ) -> Option<thread::JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            // Already started
            return None;
        }

        info!(interval_ms = self.interval.as_millis() as u64, "Starting window tracker");

        let running = Arc::clone(&self.running);
        let interval = self.interval;

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match query.active_window() {
                    Some(raw) if !raw.trim().is_empty() => {
                        let identifier = normalize_identifier(&raw);
                        if context.get() != identifier {
                            debug!(window = %identifier, "Foreground window changed");
                        }
                        context.replace(identifier);
                    }
                    // Failure or empty result: keep the previous value
                    _ => {}
                }

                notify();
                thread::sleep(interval);
            }
            debug!("Window tracker stopped");
        });

        Some(handle)
    }

    /// Request a stop. Best-effort: the loop notices within one interval.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
