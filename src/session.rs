//! Interactive search-and-select sessions.
//!
//! A session is a short-lived modal state machine: a live query string, a
//! result list recomputed through the matcher on every edit, and a
//! selection cursor clamped to the list. It opens against a snapshot of
//! the collection and the window context captured at open time, and
//! terminates on confirm, escape, or explicit dismissal.
//!
//! At most one session is live at a time; [`SessionManager::open`] refuses
//! a second one so the caller can raise the existing surface instead.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::matcher::{self, SearchFields};
use crate::store::HotkeyDefinition;

/// Pointer selections arriving within this window are treated as echoes of
/// the same composite input event and dropped.
const SELECT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// One interactive search lifecycle, from open to confirm/cancel.
#[derive(Debug)]
pub struct SearchSession {
    all: Vec<HotkeyDefinition>,
    window_id: String,
    fields: SearchFields,
    query: String,
    results: Vec<HotkeyDefinition>,
    cursor: usize,
    state: SessionState,
    last_select: Option<Instant>,
}

impl SearchSession {
    /// Open a session over a snapshot of the collection and the window
    /// context captured now.
    pub fn open(definitions: &[HotkeyDefinition], window_id: &str, fields: SearchFields) -> Self {
        let all = definitions.to_vec();
        let results = matcher::filter(&all, window_id, "", fields);
        debug!(
            window = %window_id,
            results = results.len(),
            "Opened search session"
        );
        Self {
            all,
            window_id: window_id.to_string(),
            fields,
            query: String::new(),
            results,
            cursor: 0,
            state: SessionState::Open,
            last_select: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[HotkeyDefinition] {
        &self.results
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The entry currently under the cursor.
    pub fn highlighted(&self) -> Option<&HotkeyDefinition> {
        self.results.get(self.cursor)
    }

    /// Replace the query and recompute the result list.
    ///
    /// The cursor is preserved when still in range, otherwise reset to 0.
    pub fn set_query(&mut self, query: &str) {
        if !self.is_open() {
            return;
        }
        self.query = query.to_string();
        self.results = matcher::filter(&self.all, &self.window_id, &self.query, self.fields);
        if self.cursor >= self.results.len() {
            self.cursor = 0;
        }
    }

    /// Move the cursor down one entry. Clamped, never wraps.
    pub fn move_down(&mut self) {
        if self.is_open() && self.cursor + 1 < self.results.len() {
            self.cursor += 1;
        }
    }

    /// Move the cursor up one entry. Clamped, never wraps.
    pub fn move_up(&mut self) {
        if self.is_open() && self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Confirm the highlighted entry: returns it and closes the session.
    ///
    /// With no results this is a no-op and the session stays open.
    pub fn confirm(&mut self) -> Option<HotkeyDefinition> {
        if !self.is_open() {
            return None;
        }
        let chosen = self.results.get(self.cursor)?.clone();
        debug!(description = %chosen.description, "Session confirmed");
        self.state = SessionState::Closed;
        Some(chosen)
    }

    /// Close without dispatching anything.
    pub fn cancel(&mut self) {
        if self.is_open() {
            debug!("Session cancelled");
            self.state = SessionState::Closed;
        }
    }

    /// Pointer-equivalent selection: move the cursor to `index` and
    /// confirm, debounced against double-fire from composite input events.
    pub fn select_at(&mut self, index: usize) -> Option<HotkeyDefinition> {
        self.select_at_instant(index, Instant::now())
    }

    fn select_at_instant(&mut self, index: usize, now: Instant) -> Option<HotkeyDefinition> {
        if !self.is_open() {
            return None;
        }
        if let Some(previous) = self.last_select {
            if now.duration_since(previous) < SELECT_DEBOUNCE {
                return None;
            }
        }
        self.last_select = Some(now);
        if index >= self.results.len() {
            return None;
        }
        self.cursor = index;
        self.confirm()
    }
}

/// Outcome of asking the manager to open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opened {
    /// A fresh session was created.
    New,
    /// A session is already live; bring its surface to the foreground.
    AlreadyOpen,
}

/// Owns the at-most-one live session.
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<SearchSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a popup session unless one is already live.
    pub fn open(&mut self, definitions: &[HotkeyDefinition], window_id: &str) -> Opened {
        if matches!(&self.active, Some(session) if session.is_open()) {
            debug!("Search session already open, raising instead");
            return Opened::AlreadyOpen;
        }
        self.active = Some(SearchSession::open(
            definitions,
            window_id,
            SearchFields::Popup,
        ));
        Opened::New
    }

    pub fn active_mut(&mut self) -> Option<&mut SearchSession> {
        self.active.as_mut().filter(|s| s.is_open())
    }

    pub fn is_open(&self) -> bool {
        matches!(&self.active, Some(session) if session.is_open())
    }

    /// Drop the live session, if any, with no dispatch.
    pub fn dismiss(&mut self) {
        if let Some(session) = self.active.as_mut() {
            session.cancel();
        }
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ActionSpec;
    use chrono::Utc;

    fn definition(scope: &str, combo: &str, desc: &str) -> HotkeyDefinition {
        HotkeyDefinition {
            window_scope: scope.to_string(),
            key_combo: combo.to_string(),
            description: desc.to_string(),
            action: ActionSpec::parse("cmd:true"),
            created: Utc::now(),
        }
    }

    fn sample() -> Vec<HotkeyDefinition> {
        vec![
            definition("", "ctrl+r", "reload page"),
            definition("Terminal", "ctrl+t", "new tab"),
            definition("", "ctrl+k", "search docs"),
        ]
    }

    #[test]
    fn opens_with_scope_filtered_results() {
        let session = SearchSession::open(&sample(), "Firefox", SearchFields::Popup);
        // The Terminal-scoped entry is filtered out
        assert_eq!(session.results().len(), 2);
        assert_eq!(session.cursor(), 0);
        assert!(session.is_open());
    }

    #[test]
    fn query_recomputes_results_over_whole_collection() {
        let mut session = SearchSession::open(&sample(), "Firefox", SearchFields::Popup);
        session.set_query("new");
        // Scope no longer applies once a query is present
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.results()[0].description, "new tab");
    }

    #[test]
    fn cursor_resets_when_results_shrink_past_it() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.move_down();
        session.move_down();
        assert_eq!(session.cursor(), 2);
        session.set_query("reload");
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn cursor_preserved_while_in_range() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.move_down();
        assert_eq!(session.cursor(), 1);
        session.set_query("ctrl");
        assert_eq!(session.results().len(), 3);
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn cursor_clamps_and_never_wraps() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.move_up();
        assert_eq!(session.cursor(), 0);
        for _ in 0..10 {
            session.move_down();
        }
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn confirm_returns_highlighted_and_closes() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.move_down();
        let chosen = session.confirm().expect("a highlighted entry");
        assert_eq!(chosen.description, "new tab");
        assert!(!session.is_open());
        // Terminal state: further input is inert
        assert!(session.confirm().is_none());
        session.move_down();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn confirm_with_no_results_stays_open() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.set_query("zzz no such entry");
        assert!(session.results().is_empty());
        assert!(session.confirm().is_none());
        assert!(session.is_open());
    }

    #[test]
    fn cancel_closes_without_dispatch() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        session.cancel();
        assert!(!session.is_open());
    }

    #[test]
    fn select_at_confirms_that_entry() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        let chosen = session
            .select_at_instant(2, Instant::now())
            .expect("selection");
        assert_eq!(chosen.description, "search docs");
        assert!(!session.is_open());
    }

    #[test]
    fn select_debounce_absorbs_the_echo() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        let t0 = Instant::now();

        // First fire lands but out-of-range, stamping the debounce window
        assert!(session.select_at_instant(99, t0).is_none());
        assert!(session.is_open());

        // Echo 30ms later is dropped even though the index is valid
        assert!(session
            .select_at_instant(0, t0 + Duration::from_millis(30))
            .is_none());
        assert!(session.is_open());

        // A genuine second selection after the window goes through
        assert!(session
            .select_at_instant(0, t0 + Duration::from_millis(150))
            .is_some());
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut session = SearchSession::open(&sample(), "Unknown", SearchFields::Popup);
        assert!(session.select_at_instant(10, Instant::now()).is_none());
        assert!(session.is_open());
    }

    #[test]
    fn manager_allows_only_one_live_session() {
        let defs = sample();
        let mut manager = SessionManager::new();
        assert_eq!(manager.open(&defs, "Unknown"), Opened::New);
        assert_eq!(manager.open(&defs, "Unknown"), Opened::AlreadyOpen);
        assert!(manager.is_open());
    }

    #[test]
    fn manager_reopens_after_confirm() {
        let defs = sample();
        let mut manager = SessionManager::new();
        assert_eq!(manager.open(&defs, "Unknown"), Opened::New);
        manager.active_mut().unwrap().confirm();
        assert!(!manager.is_open());
        assert_eq!(manager.open(&defs, "Unknown"), Opened::New);
    }

    #[test]
    fn manager_dismiss_drops_the_session() {
        let defs = sample();
        let mut manager = SessionManager::new();
        manager.open(&defs, "Unknown");
        manager.dismiss();
        assert!(!manager.is_open());
        assert!(manager.active_mut().is_none());
    }
}
