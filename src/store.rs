//! Durable hotkey storage.
//!
//! The hotkey collection is a flat JSON array at
//! `~/.config/keycut/hotkeys.json`, rewritten in full on every mutating
//! operation. Insertion order is display order. No business logic lives
//! here - validation happens at the input boundary (`service`), matching
//! in `matcher`.
//!
//! The auxiliary `data.json` (single `github_token` field) is handled by
//! `TokenStore`; the GitHub workflow that consumes the token is an
//! external collaborator.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// What a hotkey does when dispatched.
///
/// Persisted as the flat string form the original file format uses:
/// `http...` opens a URL, `cmd:...` spawns a detached process, `copy:...`
/// writes to the clipboard, anything else runs through the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionSpec {
    OpenUrl(String),
    RunDetached(String),
    CopyText(String),
    RunShell(String),
}

impl ActionSpec {
    /// Classify a raw action string.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http") {
            ActionSpec::OpenUrl(raw.to_string())
        } else if let Some(rest) = raw.strip_prefix("cmd:") {
            ActionSpec::RunDetached(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("copy:") {
            ActionSpec::CopyText(rest.to_string())
        } else {
            ActionSpec::RunShell(raw.to_string())
        }
    }

    /// The flat string form stored on disk.
    pub fn to_raw(&self) -> String {
        match self {
            ActionSpec::OpenUrl(url) => url.clone(),
            ActionSpec::RunDetached(cmd) => format!("cmd:{}", cmd),
            ActionSpec::CopyText(text) => format!("copy:{}", text),
            ActionSpec::RunShell(raw) => raw.clone(),
        }
    }
}

impl From<String> for ActionSpec {
    fn from(raw: String) -> Self {
        ActionSpec::parse(&raw)
    }
}

impl From<ActionSpec> for String {
    fn from(action: ActionSpec) -> Self {
        action.to_raw()
    }
}

/// One persisted hotkey definition.
///
/// `window_scope` empty means global; otherwise it is a case-insensitive
/// prefix the current window identifier must start with. `key_combo` and
/// `description` are never empty for a persisted definition (enforced at
/// the creation/edit boundary, not here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyDefinition {
    #[serde(rename = "window", default)]
    pub window_scope: String,
    #[serde(rename = "hotkey")]
    pub key_combo: String,
    pub description: String,
    pub action: ActionSpec,
    #[serde(rename = "created")]
    pub created: DateTime<Utc>,
}

/// Owner of the durable hotkey collection.
#[derive(Debug, Clone)]
pub struct HotkeyStore {
    definitions: Vec<HotkeyDefinition>,
    file_path: PathBuf,
}

impl HotkeyStore {
    /// Create a store at the default path (`~/.config/keycut/hotkeys.json`).
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(
            shellexpand::tilde("~/.config/keycut/hotkeys.json").as_ref(),
        ))
    }

    /// Create a store with a custom path (config override, tests).
    pub fn with_path(path: PathBuf) -> Self {
        HotkeyStore {
            definitions: Vec::new(),
            file_path: path,
        }
    }

    /// Load the collection from disk.
    ///
    /// A missing file starts an empty collection. A file that fails to
    /// parse also starts empty, with a warning - a corrupt data file must
    /// never prevent startup.
    #[instrument(name = "hotkeys_load", skip(self))]
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            info!(path = %self.file_path.display(), "Hotkey file not found, starting fresh");
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.file_path).with_context(|| {
            format!("Failed to read hotkey file: {}", self.file_path.display())
        })?;

        match serde_json::from_str::<Vec<HotkeyDefinition>>(&content) {
            Ok(definitions) => {
                info!(
                    path = %self.file_path.display(),
                    count = definitions.len(),
                    "Loaded hotkeys"
                );
                self.definitions = definitions;
            }
            Err(e) => {
                warn!(
                    path = %self.file_path.display(),
                    error = %e,
                    "Hotkey file is corrupt, starting with an empty collection"
                );
                self.definitions = Vec::new();
            }
        }
        Ok(())
    }

    /// Write the full collection to disk using atomic write (temp + rename).
    #[instrument(name = "hotkeys_save", skip(self))]
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.file_path, &self.definitions)?;
        info!(
            path = %self.file_path.display(),
            count = self.definitions.len(),
            "Saved hotkeys"
        );
        Ok(())
    }

    pub fn definitions(&self) -> &[HotkeyDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Append a definition. Insertion order is display order.
    pub fn add(&mut self, definition: HotkeyDefinition) {
        debug!(combo = %definition.key_combo, "Added hotkey");
        self.definitions.push(definition);
    }

    /// Replace the definition at `index` wholesale (no partial patching).
    pub fn replace_at(&mut self, index: usize, definition: HotkeyDefinition) -> Result<()> {
        if index >= self.definitions.len() {
            bail!("index {} out of range (len {})", index, self.definitions.len());
        }
        self.definitions[index] = definition;
        Ok(())
    }

    /// Remove and return the definition at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<HotkeyDefinition> {
        if index >= self.definitions.len() {
            bail!("index {} out of range (len {})", index, self.definitions.len());
        }
        Ok(self.definitions.remove(index))
    }

    /// Replace the whole collection (import flow).
    pub fn replace_all(&mut self, definitions: Vec<HotkeyDefinition>) {
        self.definitions = definitions;
    }

    /// Export the collection to an arbitrary path.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.definitions)?;
        info!(path = %path.display(), count = self.definitions.len(), "Exported hotkeys");
        Ok(())
    }

    /// Import a collection from an arbitrary path, replacing the current
    /// one. Returns the number of imported definitions. Unlike `load`,
    /// a file that does not parse is an error - the current collection is
    /// left untouched.
    pub fn import_from(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import file: {}", path.display()))?;
        let definitions: Vec<HotkeyDefinition> = serde_json::from_str(&content)
            .with_context(|| format!("Import file is not a hotkey list: {}", path.display()))?;
        let count = definitions.len();
        self.definitions = definitions;
        info!(path = %path.display(), count, "Imported hotkeys");
        Ok(count)
    }
}

impl Default for HotkeyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenData {
    #[serde(default)]
    github_token: String,
}

/// Owner of the auxiliary token file (`data.json`).
#[derive(Debug)]
pub struct TokenStore {
    token: String,
    file_path: PathBuf,
}

impl TokenStore {
    pub fn with_path(path: PathBuf) -> Self {
        TokenStore {
            token: String::new(),
            file_path: path,
        }
    }

    /// Load the token. Missing or corrupt file yields an empty token.
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.file_path).with_context(|| {
            format!("Failed to read token file: {}", self.file_path.display())
        })?;
        match serde_json::from_str::<TokenData>(&content) {
            Ok(data) => self.token = data.github_token,
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "Token file is corrupt");
                self.token = String::new();
            }
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Replace the token and rewrite the file in full.
    pub fn set_token(&mut self, token: String) -> Result<()> {
        self.token = token;
        write_json_atomic(
            &self.file_path,
            &TokenData {
                github_token: self.token.clone(),
            },
        )
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    // Atomic on Unix; best-effort on Windows
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(scope: &str, combo: &str, desc: &str, action: &str) -> HotkeyDefinition {
        HotkeyDefinition {
            window_scope: scope.to_string(),
            key_combo: combo.to_string(),
            description: desc.to_string(),
            action: ActionSpec::parse(action),
            created: Utc::now(),
        }
    }

    #[test]
    fn action_spec_classification() {
        assert_eq!(
            ActionSpec::parse("https://example.com"),
            ActionSpec::OpenUrl("https://example.com".to_string())
        );
        assert_eq!(
            ActionSpec::parse("cmd:ls -la"),
            ActionSpec::RunDetached("ls -la".to_string())
        );
        assert_eq!(
            ActionSpec::parse("copy:hello"),
            ActionSpec::CopyText("hello".to_string())
        );
        assert_eq!(
            ActionSpec::parse("make all"),
            ActionSpec::RunShell("make all".to_string())
        );
    }

    #[test]
    fn action_spec_round_trips_raw_form() {
        for raw in ["https://example.com", "cmd:xdotool key F5", "copy:x", "make all"] {
            assert_eq!(ActionSpec::parse(raw).to_raw(), raw);
        }
    }

    #[test]
    fn definition_serializes_with_original_field_names() {
        let def = definition("Terminal", "ctrl+t", "new tab", "cmd:xterm");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["window"], "Terminal");
        assert_eq!(json["hotkey"], "ctrl+t");
        assert_eq!(json["description"], "new tab");
        assert_eq!(json["action"], "cmd:xterm");
        assert!(json["created"].is_string());
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.json");

        let mut store = HotkeyStore::with_path(path.clone());
        store.add(definition("", "ctrl+r", "reload", "cmd:xdotool key F5"));
        store.add(definition("Firefox", "ctrl+l", "focus bar", "copy:url"));
        store.add(definition("Terminal", "ctrl+t", "new tab", "https://example.com"));
        store.save().unwrap();

        let mut loaded = HotkeyStore::with_path(path);
        loaded.load().unwrap();
        assert_eq!(loaded.definitions(), store.definitions());
    }

    #[test]
    fn load_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HotkeyStore::with_path(dir.path().join("none.json"));
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.json");
        std::fs::write(&path, "{definitely not a list").unwrap();

        let mut store = HotkeyStore::with_path(path);
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn replace_at_swaps_wholesale() {
        let mut store = HotkeyStore::with_path(PathBuf::from("/nonexistent"));
        store.add(definition("", "ctrl+a", "first", "copy:a"));
        let replacement = definition("Code", "ctrl+b", "second", "copy:b");
        store.replace_at(0, replacement.clone()).unwrap();
        assert_eq!(store.definitions()[0], replacement);
    }

    #[test]
    fn replace_and_remove_reject_bad_index() {
        let mut store = HotkeyStore::with_path(PathBuf::from("/nonexistent"));
        store.add(definition("", "ctrl+a", "only", "copy:a"));
        assert!(store
            .replace_at(1, definition("", "ctrl+b", "x", "copy:b"))
            .is_err());
        assert!(store.remove_at(5).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_at_preserves_order_of_rest() {
        let mut store = HotkeyStore::with_path(PathBuf::from("/nonexistent"));
        store.add(definition("", "ctrl+a", "a", "copy:a"));
        store.add(definition("", "ctrl+b", "b", "copy:b"));
        store.add(definition("", "ctrl+c", "c", "copy:c"));
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.description, "b");
        let descs: Vec<_> = store.definitions().iter().map(|d| d.description.as_str()).collect();
        assert_eq!(descs, ["a", "c"]);
    }

    #[test]
    fn export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("backup.json");

        let mut store = HotkeyStore::with_path(dir.path().join("hotkeys.json"));
        store.add(definition("", "ctrl+a", "a", "copy:a"));
        store.add(definition("Term", "ctrl+b", "b", "cmd:true"));
        store.export_to(&backup).unwrap();

        let mut other = HotkeyStore::with_path(dir.path().join("other.json"));
        let count = other.import_from(&backup).unwrap();
        assert_eq!(count, 2);
        assert_eq!(other.definitions(), store.definitions());
    }

    #[test]
    fn import_rejects_garbage_and_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"not": "a list"}"#).unwrap();

        let mut store = HotkeyStore::with_path(dir.path().join("hotkeys.json"));
        store.add(definition("", "ctrl+a", "keep me", "copy:a"));
        assert!(store.import_from(&bad).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn token_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = TokenStore::with_path(path.clone());
        store.load().unwrap();
        assert_eq!(store.token(), "");

        store.set_token("ghp_abc123".to_string()).unwrap();

        let mut reloaded = TokenStore::with_path(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.token(), "ghp_abc123");
    }

    #[test]
    fn token_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "oops").unwrap();

        let mut store = TokenStore::with_path(path);
        store.load().unwrap();
        assert_eq!(store.token(), "");
    }
}
