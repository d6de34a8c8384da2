//! OS-level binding of the fixed system shortcuts.
//!
//! Only three shortcuts are ever registered with the OS: toggle main
//! window, save all, and open search. User-defined hotkeys are reachable
//! through the search popup only; `rebuild` iterates the collection so a
//! per-definition binding can be added there later, but today that loop
//! binds nothing.
//!
//! `rebuild` must be called after every mutation of the collection. It
//! unconditionally unbinds everything it previously bound and rebinds the
//! fixed set, so handler wiring never captures a stale snapshot. It is
//! idempotent.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use global_hotkey::{
    hotkey::HotKey, Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::combo::KeyCombo;
use crate::config::ShortcutConfig;
use crate::store::HotkeyDefinition;

/// The fixed commands bound at the OS level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCommand {
    ToggleMainWindow,
    SaveAll,
    OpenSearch,
}

impl SystemCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::ToggleMainWindow => "toggle-main-window",
            Self::SaveAll => "save-all",
            Self::OpenSearch => "open-search",
        }
    }
}

/// Format a hotkey registration error with helpful context
fn format_hotkey_error(e: &HotkeyError, combo: &str) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => format!(
            "Hotkey '{}' is already registered by another application (ID: {}). \
             Try a different combo or close the conflicting app.",
            combo,
            hk.id()
        ),
        HotkeyError::FailedToRegister(msg) => format!(
            "System rejected hotkey '{}': {}. This combo may be reserved by the OS.",
            combo, msg
        ),
        HotkeyError::OsError(os_err) => format!(
            "OS error registering '{}': {}. Check system hotkey settings.",
            combo, os_err
        ),
        other => format!("Failed to register hotkey '{}': {}", combo, other),
    }
}

/// Maintains the binding between the fixed shortcuts and their commands.
pub struct GlobalShortcutRegistry {
    manager: GlobalHotKeyManager,
    /// The fixed (combo, command) set, resolved from config once.
    fixed: Vec<(KeyCombo, SystemCommand)>,
    /// hotkey id -> command, for the event pump.
    bindings: HashMap<u32, SystemCommand>,
    /// Everything currently bound, kept for unregistration.
    bound: Vec<HotKey>,
}

impl GlobalShortcutRegistry {
    /// Create the registry. Fails only when the OS hotkey manager itself
    /// cannot be created (e.g. no display connection).
    pub fn new(shortcuts: &ShortcutConfig) -> Result<Self> {
        let manager =
            GlobalHotKeyManager::new().context("Failed to create global hotkey manager")?;
        Ok(Self {
            manager,
            fixed: resolve_fixed_set(shortcuts),
            bindings: HashMap::new(),
            bound: Vec::new(),
        })
    }

    /// Tear down every binding and rebind the fixed set.
    ///
    /// Individual binding failures are logged and skipped; the registry
    /// keeps serving whatever did bind and the next rebuild retries.
    pub fn rebuild(&mut self, definitions: &[HotkeyDefinition]) {
        for hotkey in self.bound.drain(..) {
            let id = hotkey.id();
            if let Err(e) = self.manager.unregister(hotkey) {
                warn!(id, error = %e, "Failed to unregister hotkey");
            }
        }
        self.bindings.clear();

        for (combo, command) in &self.fixed {
            let command = *command;
            let Some(hotkey) = combo.to_hotkey() else {
                warn!(combo = %combo, command = command.label(), "Combo not bindable at OS level");
                continue;
            };
            let id = hotkey.id();
            match self.manager.register(hotkey) {
                Ok(()) => {
                    debug!(
                        combo = %combo,
                        command = command.label(),
                        id,
                        "Registered system shortcut"
                    );
                    self.bindings.insert(id, command);
                    self.bound.push(hotkey);
                }
                Err(e) => {
                    warn!(
                        command = command.label(),
                        "{}",
                        format_hotkey_error(&e, &combo.to_canonical_string())
                    );
                }
            }
        }

        // User-defined hotkeys are not bound at the OS level; they are
        // reachable through the search popup. This loop is the seam where
        // per-definition binding would go.
        for definition in definitions {
            debug!(
                combo = %definition.key_combo,
                "User hotkey reachable via search only"
            );
        }

        info!(
            bound = self.bindings.len(),
            definitions = definitions.len(),
            "Rebuilt global shortcut bindings"
        );
    }

    /// The command bound to a hotkey id, if any.
    pub fn command_for(&self, id: u32) -> Option<SystemCommand> {
        self.bindings.get(&id).copied()
    }

    /// Currently bound (id, command) pairs, sorted by id for comparison.
    pub fn binding_table(&self) -> Vec<(u32, SystemCommand)> {
        let mut table: Vec<_> = self.bindings.iter().map(|(id, cmd)| (*id, *cmd)).collect();
        table.sort_by_key(|(id, _)| *id);
        table
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }
}

/// Parse the configured combos, falling back to the defaults for entries
/// that do not parse (transient-error discipline: warn and continue).
fn resolve_fixed_set(shortcuts: &ShortcutConfig) -> Vec<(KeyCombo, SystemCommand)> {
    let defaults = ShortcutConfig::default();
    let entries = [
        (
            &shortcuts.toggle_window,
            &defaults.toggle_window,
            SystemCommand::ToggleMainWindow,
        ),
        (&shortcuts.save_all, &defaults.save_all, SystemCommand::SaveAll),
        (
            &shortcuts.open_search,
            &defaults.open_search,
            SystemCommand::OpenSearch,
        ),
    ];

    entries
        .into_iter()
        .map(|(configured, fallback, command)| {
            let combo = KeyCombo::parse(configured).unwrap_or_else(|e| {
                warn!(
                    combo = %configured,
                    command = command.label(),
                    error = %e,
                    "Configured combo invalid, using default"
                );
                KeyCombo::parse(fallback).expect("default combos parse")
            });
            (combo, command)
        })
        .collect()
}

/// Pump `GlobalHotKeyEvent`s into the UI context.
///
/// Runs until the event receiver closes. Only key presses fire; releases
/// are ignored. `forward` must be cheap and non-blocking (enqueue into the
/// UI event loop).
pub fn spawn_event_pump(
    registry: Arc<Mutex<GlobalShortcutRegistry>>,
    forward: impl Fn(SystemCommand) + Send + 'static,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            let command = registry.lock().command_for(event.id);
            match command {
                Some(command) => {
                    debug!(id = event.id, command = command.label(), "System shortcut pressed");
                    forward(command);
                }
                None => debug!(id = event.id, "Hotkey event with no binding"),
            }
        }
        debug!("Hotkey event pump stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ActionSpec;
    use chrono::Utc;

    // GlobalHotKeyManager needs a display connection, which test
    // environments may not have. Tests follow the same pattern as any
    // OS-dependent suite here: construct if possible, otherwise skip.
    fn create_test_registry() -> Option<GlobalShortcutRegistry> {
        GlobalShortcutRegistry::new(&ShortcutConfig::default()).ok()
    }

    fn definition(combo: &str) -> HotkeyDefinition {
        HotkeyDefinition {
            window_scope: String::new(),
            key_combo: combo.to_string(),
            description: "test".to_string(),
            action: ActionSpec::parse("cmd:true"),
            created: Utc::now(),
        }
    }

    #[test]
    fn fixed_set_resolves_three_commands() {
        let fixed = resolve_fixed_set(&ShortcutConfig::default());
        assert_eq!(fixed.len(), 3);
        let commands: Vec<_> = fixed.iter().map(|(_, c)| *c).collect();
        assert!(commands.contains(&SystemCommand::ToggleMainWindow));
        assert!(commands.contains(&SystemCommand::SaveAll));
        assert!(commands.contains(&SystemCommand::OpenSearch));
    }

    #[test]
    fn invalid_configured_combo_falls_back_to_default() {
        let shortcuts = ShortcutConfig {
            open_search: "not a combo at all".to_string(),
            ..Default::default()
        };
        let fixed = resolve_fixed_set(&shortcuts);
        let open_search = fixed
            .iter()
            .find(|(_, c)| *c == SystemCommand::OpenSearch)
            .unwrap();
        assert_eq!(open_search.0.to_canonical_string(), "alt+r");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let Some(mut registry) = create_test_registry() else {
            return;
        };
        let defs = vec![definition("ctrl+shift+a")];
        registry.rebuild(&defs);
        let first = registry.binding_table();
        registry.rebuild(&defs);
        let second = registry.binding_table();
        assert_eq!(first, second);
    }

    #[test]
    fn rebuild_binds_at_most_the_fixed_set() {
        let Some(mut registry) = create_test_registry() else {
            return;
        };
        // Many user definitions, still no per-definition OS binding
        let defs: Vec<_> = (0..20).map(|_| definition("ctrl+shift+z")).collect();
        registry.rebuild(&defs);
        assert!(registry.bound_count() <= 3);
    }

    #[test]
    fn command_for_unknown_id_is_none() {
        let Some(registry) = create_test_registry() else {
            return;
        };
        assert!(registry.command_for(u32::MAX).is_none());
    }
}
