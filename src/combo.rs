//! Key combination parsing, canonicalization, and display.
//!
//! A `KeyCombo` is the validated form of the `hotkey` field on a
//! definition: modifier flags plus one canonical lowercase key. The
//! canonical string form (`ctrl+shift+a`) is what gets persisted; parsing
//! happens at the input boundary, storage never re-validates.

use std::fmt;

use global_hotkey::hotkey::{Code, HotKey, Modifiers as HotKeyModifiers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a combo string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComboParseError {
    #[error("key combo is empty")]
    Empty,
    #[error("key combo has no key, only modifiers")]
    MissingKey,
    #[error("unknown token '{0}' in key combo")]
    UnknownToken(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Modifier keys for a combo.
///
/// Note on `cmd` (platform accelerator):
/// - On macOS: Command
/// - On Windows/Linux: Super/Win
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub cmd: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.cmd || self.ctrl || self.alt || self.shift
    }
}

/// A key combination consisting of modifier keys and a main key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombo {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    /// Parse a combo string like `ctrl+shift+a` or `Alt + F4`.
    ///
    /// Modifier aliases (`control`, `option`, `meta`, ...) are folded, the
    /// key is canonicalized to lowercase, and unknown keys are rejected.
    pub fn parse(s: &str) -> Result<Self, ComboParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ComboParseError::Empty);
        }

        let normalized = s.replace('+', " ");
        let parts: Vec<&str> = normalized.split_whitespace().collect();
        if parts.is_empty() {
            return Err(ComboParseError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut key_part: Option<&str> = None;

        for part in &parts {
            let part_lower = part.to_lowercase();
            match part_lower.as_str() {
                "cmd" | "command" | "meta" | "super" | "win" | "mod" => modifiers.cmd = true,
                "ctrl" | "control" | "ctl" => modifiers.ctrl = true,
                "alt" | "opt" | "option" => modifiers.alt = true,
                "shift" | "shft" => modifiers.shift = true,
                _ => {
                    if key_part.is_some() {
                        return Err(ComboParseError::UnknownToken(part.to_string()));
                    }
                    key_part = Some(part);
                }
            }
        }

        let key = key_part.ok_or(ComboParseError::MissingKey)?;
        let canonical_key = canonicalize_key(key);
        if !is_known_key(&canonical_key) {
            return Err(ComboParseError::UnknownKey(key.to_string()));
        }

        Ok(Self {
            key: canonical_key,
            modifiers,
        })
    }

    /// The canonical lowercase string form, modifiers in alphabetical
    /// order: `alt+cmd+ctrl+shift+<key>`.
    pub fn to_canonical_string(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.modifiers.alt {
            parts.push("alt");
        }
        if self.modifiers.cmd {
            parts.push("cmd");
        }
        if self.modifiers.ctrl {
            parts.push("ctrl");
        }
        if self.modifiers.shift {
            parts.push("shift");
        }
        parts.push(&self.key);
        parts.join("+")
    }

    /// Convert to a `global-hotkey` registration, if the key is one the OS
    /// binding layer supports.
    pub fn to_hotkey(&self) -> Option<HotKey> {
        let code = key_to_code(&self.key)?;
        let mut mods = HotKeyModifiers::empty();
        if self.modifiers.cmd {
            mods |= HotKeyModifiers::META;
        }
        if self.modifiers.ctrl {
            mods |= HotKeyModifiers::CONTROL;
        }
        if self.modifiers.alt {
            mods |= HotKeyModifiers::ALT;
        }
        if self.modifiers.shift {
            mods |= HotKeyModifiers::SHIFT;
        }
        Some(HotKey::new(Some(mods), code))
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

/// Canonicalize a key name to the internal standard form.
pub fn canonicalize_key(key: &str) -> String {
    let key_lower = key.to_lowercase();
    match key_lower.as_str() {
        "arrowup" | "uparrow" => "up",
        "arrowdown" | "downarrow" => "down",
        "arrowleft" | "leftarrow" => "left",
        "arrowright" | "rightarrow" => "right",
        "return" => "enter",
        "esc" => "escape",
        "back" => "backspace",
        "del" => "delete",
        "/" | "forwardslash" => "slash",
        "\\" => "backslash",
        ";" => "semicolon",
        "'" | "apostrophe" => "quote",
        "," => "comma",
        "." | "dot" => "period",
        "[" | "leftbracket" => "bracketleft",
        "]" | "rightbracket" => "bracketright",
        "-" | "dash" | "hyphen" => "minus",
        "=" | "equals" => "equal",
        "`" | "backtick" | "grave" => "backquote",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        _ => return key_lower,
    }
    .to_string()
}

/// Check if a key name is known/valid.
pub fn is_known_key(key: &str) -> bool {
    if key.len() == 1 {
        let c = key.chars().next().unwrap();
        return c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    matches!(
        key,
        "f1" | "f2"
            | "f3"
            | "f4"
            | "f5"
            | "f6"
            | "f7"
            | "f8"
            | "f9"
            | "f10"
            | "f11"
            | "f12"
            | "space"
            | "enter"
            | "tab"
            | "escape"
            | "backspace"
            | "delete"
            | "up"
            | "down"
            | "left"
            | "right"
            | "home"
            | "end"
            | "pageup"
            | "pagedown"
            | "semicolon"
            | "quote"
            | "comma"
            | "period"
            | "slash"
            | "backslash"
            | "bracketleft"
            | "bracketright"
            | "minus"
            | "equal"
            | "backquote"
    )
}

/// Map a canonical key name to the `global-hotkey` key code.
fn key_to_code(key: &str) -> Option<Code> {
    let code = match key {
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "space" => Code::Space,
        "enter" => Code::Enter,
        "tab" => Code::Tab,
        "escape" => Code::Escape,
        "backspace" => Code::Backspace,
        "delete" => Code::Delete,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "semicolon" => Code::Semicolon,
        "quote" => Code::Quote,
        "comma" => Code::Comma,
        "period" => Code::Period,
        "slash" => Code::Slash,
        "backslash" => Code::Backslash,
        "bracketleft" => Code::BracketLeft,
        "bracketright" => Code::BracketRight,
        "minus" => Code::Minus,
        "equal" => Code::Equal,
        "backquote" => Code::Backquote,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_combo() {
        let combo = KeyCombo::parse("ctrl+shift+a").unwrap();
        assert!(combo.modifiers.ctrl);
        assert!(combo.modifiers.shift);
        assert!(!combo.modifiers.alt);
        assert_eq!(combo.key, "a");
    }

    #[test]
    fn parse_is_case_and_whitespace_insensitive() {
        let combo = KeyCombo::parse("Ctrl + Shift+A").unwrap();
        assert_eq!(combo.to_canonical_string(), "ctrl+shift+a");
    }

    #[test]
    fn parse_folds_modifier_aliases() {
        let combo = KeyCombo::parse("control+option+f4").unwrap();
        assert!(combo.modifiers.ctrl);
        assert!(combo.modifiers.alt);
        assert_eq!(combo.key, "f4");
    }

    #[test]
    fn parse_bare_key() {
        let combo = KeyCombo::parse("f1").unwrap();
        assert!(!combo.modifiers.any());
        assert_eq!(combo.to_canonical_string(), "f1");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(KeyCombo::parse(""), Err(ComboParseError::Empty));
        assert_eq!(KeyCombo::parse("   "), Err(ComboParseError::Empty));
    }

    #[test]
    fn parse_rejects_modifier_only() {
        assert_eq!(
            KeyCombo::parse("ctrl+shift"),
            Err(ComboParseError::MissingKey)
        );
    }

    #[test]
    fn parse_rejects_two_keys() {
        assert_eq!(
            KeyCombo::parse("a+b"),
            Err(ComboParseError::UnknownToken("b".to_string()))
        );
    }

    #[test]
    fn parse_rejects_unknown_key() {
        assert_eq!(
            KeyCombo::parse("ctrl+widget"),
            Err(ComboParseError::UnknownKey("widget".to_string()))
        );
    }

    #[test]
    fn canonical_string_orders_modifiers() {
        let combo = KeyCombo::parse("shift+ctrl+alt+x").unwrap();
        assert_eq!(combo.to_canonical_string(), "alt+ctrl+shift+x");
    }

    #[test]
    fn canonicalize_key_aliases() {
        assert_eq!(canonicalize_key("Return"), "enter");
        assert_eq!(canonicalize_key("Esc"), "escape");
        assert_eq!(canonicalize_key("ArrowDown"), "down");
        assert_eq!(canonicalize_key(";"), "semicolon");
    }

    #[test]
    fn to_hotkey_maps_known_keys() {
        let combo = KeyCombo::parse("ctrl+alt+h").unwrap();
        assert!(combo.to_hotkey().is_some());
        let combo = KeyCombo::parse("alt+r").unwrap();
        assert!(combo.to_hotkey().is_some());
    }

    #[test]
    fn round_trip_through_canonical_string() {
        for raw in ["ctrl+shift+a", "alt+f4", "f1", "cmd+space"] {
            let combo = KeyCombo::parse(raw).unwrap();
            let reparsed = KeyCombo::parse(&combo.to_canonical_string()).unwrap();
            assert_eq!(combo, reparsed);
        }
    }
}
