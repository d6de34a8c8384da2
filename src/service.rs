//! Mutation discipline over the hotkey collection.
//!
//! Every change goes through here: validate at the boundary, mutate the
//! in-memory collection, flush the whole file, rebuild the OS shortcut
//! bindings. A persistence failure is surfaced as a status message but
//! the in-memory state stays authoritative for the session - there is no
//! rollback.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::warn;

use crate::combo::KeyCombo;
use crate::dispatch;
use crate::error::KeycutError;
use crate::logging;
use crate::registry::GlobalShortcutRegistry;
use crate::store::{ActionSpec, HotkeyDefinition, HotkeyStore};

/// Raw user input for an add or edit flow. The UI collaborator collects
/// the fields; validation happens here.
#[derive(Debug, Clone, Default)]
pub struct HotkeyDraft {
    pub window_scope: String,
    pub key_combo: String,
    pub description: String,
    pub action: String,
}

/// Coordinates store mutations with persistence and shortcut rebuilds.
pub struct HotkeyService {
    store: HotkeyStore,
    /// Absent in headless setups (no display connection); rebuilds are
    /// then skipped, everything else works the same.
    registry: Option<Arc<Mutex<GlobalShortcutRegistry>>>,
}

impl HotkeyService {
    pub fn new(store: HotkeyStore, registry: Option<Arc<Mutex<GlobalShortcutRegistry>>>) -> Self {
        Self { store, registry }
    }

    pub fn definitions(&self) -> &[HotkeyDefinition] {
        self.store.definitions()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Validate a draft into a definition, stamping `created` now.
    fn validate(draft: &HotkeyDraft) -> Result<HotkeyDefinition, KeycutError> {
        let combo = KeyCombo::parse(&draft.key_combo)
            .map_err(|e| KeycutError::Validation(format!("key combo: {}", e)))?;

        let description = draft.description.trim();
        if description.is_empty() {
            return Err(KeycutError::Validation(
                "description must not be empty".to_string(),
            ));
        }

        Ok(HotkeyDefinition {
            window_scope: draft.window_scope.trim().to_string(),
            key_combo: combo.to_canonical_string(),
            description: description.to_string(),
            action: ActionSpec::parse(draft.action.trim()),
            created: Utc::now(),
        })
    }

    /// Add a new definition from user input.
    pub fn add(&mut self, draft: HotkeyDraft) -> Result<(), KeycutError> {
        let definition = Self::validate(&draft)?;
        self.store.add(definition);
        self.after_mutation();
        Ok(())
    }

    /// Replace the definition at `index` from a pre-populated draft.
    /// The original `created` timestamp is carried over.
    pub fn edit(&mut self, index: usize, draft: HotkeyDraft) -> Result<(), KeycutError> {
        let mut definition = Self::validate(&draft)?;
        let existing = self
            .store
            .definitions()
            .get(index)
            .ok_or_else(|| KeycutError::Validation(format!("no hotkey at index {}", index)))?;
        definition.created = existing.created;

        self.store
            .replace_at(index, definition)
            .map_err(|e| KeycutError::Validation(e.to_string()))?;
        self.after_mutation();
        Ok(())
    }

    /// Remove the definition at `index`.
    pub fn remove(&mut self, index: usize) -> Result<(), KeycutError> {
        let removed = self
            .store
            .remove_at(index)
            .map_err(|e| KeycutError::Validation(e.to_string()))?;
        logging::status(&format!("Deleted hotkey: {}", removed.description));
        self.after_mutation();
        Ok(())
    }

    /// Explicit save trigger (the save-all system shortcut).
    pub fn save_all(&mut self) {
        self.flush();
    }

    /// Export the collection to an arbitrary path.
    pub fn export_to(&self, path: &Path) -> Result<(), KeycutError> {
        self.store
            .export_to(path)
            .map_err(|e| KeycutError::Persistence(e.to_string()))?;
        logging::status(&format!("Exported {} hotkeys", self.store.len()));
        Ok(())
    }

    /// Import a collection, replacing the current one.
    pub fn import_from(&mut self, path: &Path) -> Result<usize, KeycutError> {
        let count = self
            .store
            .import_from(path)
            .map_err(|e| KeycutError::Persistence(e.to_string()))?;
        logging::status(&format!("Imported {} hotkeys", count));
        self.after_mutation();
        Ok(count)
    }

    /// Dispatch a definition's action, reporting the outcome as status.
    pub fn dispatch(&self, definition: &HotkeyDefinition) {
        match dispatch::dispatch(&definition.action) {
            Ok(()) => logging::status(&format!("Ran: {}", definition.description)),
            Err(e) => {
                let err = KeycutError::Dispatch(e.to_string());
                warn!(description = %definition.description, error = %e, "Dispatch failed");
                logging::status(&err.user_message());
            }
        }
    }

    fn after_mutation(&mut self) {
        self.flush();
        self.rebuild_shortcuts();
    }

    fn flush(&mut self) {
        match self.store.save() {
            Ok(()) => logging::status(&format!("Saved {} hotkeys", self.store.len())),
            Err(e) => {
                // In-memory state stays authoritative; no rollback
                let err = KeycutError::Persistence(e.to_string());
                warn!(error = %e, "Flush failed, keeping in-memory collection");
                logging::status(&err.user_message());
            }
        }
    }

    fn rebuild_shortcuts(&self) {
        if let Some(registry) = &self.registry {
            registry.lock().rebuild(self.store.definitions());
        }
    }
}
