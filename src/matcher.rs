//! Pure filtering of hotkey definitions against the window context and a
//! free-text query.
//!
//! Two independent predicates, composed by the search session:
//!
//! - **Scope**: a definition with an empty `window_scope` is global;
//!   otherwise the current window identifier must start with the scope,
//!   case-insensitively. An unknown or empty window identifier disables
//!   scoping entirely.
//! - **Text**: lowercased substring match against the combo and the
//!   description (the list surface also searches the scope field).
//!
//! Composition is deliberately asymmetric: an empty query yields the
//! scope-filtered set, but as soon as the query is non-empty the text
//! predicate runs over the *entire* collection and scope is ignored.
//! Search escapes scope; do not "fix" this without revisiting the
//! documented behavior.

use crate::store::HotkeyDefinition;

/// Identifier value meaning "no window context available".
pub const UNKNOWN_WINDOW: &str = "Unknown";

/// Which fields the text predicate searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFields {
    /// Combo + description (the search popup).
    Popup,
    /// Combo + description + window scope (the list-level search).
    List,
}

/// True when `definition` applies to the window identified by `window_id`.
pub fn scope_matches(definition: &HotkeyDefinition, window_id: &str) -> bool {
    let scope = definition.window_scope.trim();
    if scope.is_empty() {
        return true;
    }
    if window_id.is_empty() || window_id == UNKNOWN_WINDOW {
        // No usable context - scoping is not applied
        return true;
    }
    window_id.to_lowercase().starts_with(&scope.to_lowercase())
}

/// True when `query` is a substring of one of the searched fields.
pub fn text_matches(definition: &HotkeyDefinition, query: &str, fields: SearchFields) -> bool {
    let query = query.to_lowercase();
    if definition.key_combo.to_lowercase().contains(&query) {
        return true;
    }
    if definition.description.to_lowercase().contains(&query) {
        return true;
    }
    fields == SearchFields::List && definition.window_scope.to_lowercase().contains(&query)
}

/// Relevance score for a non-empty query. Positive iff `text_matches`.
///
/// A combo hit outranks a description hit, a prefix hit outranks an
/// interior one, and the scope field only ever contributes a small bump.
fn relevance(definition: &HotkeyDefinition, query: &str, fields: SearchFields) -> i32 {
    let query = query.to_lowercase();
    let mut score = 0i32;

    if let Some(pos) = definition.key_combo.to_lowercase().find(&query) {
        score += if pos == 0 { 100 } else { 75 };
    }
    if let Some(pos) = definition.description.to_lowercase().find(&query) {
        score += if pos == 0 { 60 } else { 40 };
    }
    if fields == SearchFields::List
        && definition.window_scope.to_lowercase().contains(&query)
    {
        score += 10;
    }

    score
}

/// Filter `definitions` for the given context and query.
///
/// Empty query: the scope-filtered set in insertion order. Non-empty
/// query: the text-filtered set over the whole collection, ranked by
/// relevance with insertion order as the tie-break.
pub fn filter(
    definitions: &[HotkeyDefinition],
    window_id: &str,
    query: &str,
    fields: SearchFields,
) -> Vec<HotkeyDefinition> {
    if query.is_empty() {
        return definitions
            .iter()
            .filter(|d| scope_matches(d, window_id))
            .cloned()
            .collect();
    }

    let mut scored: Vec<(i32, usize, &HotkeyDefinition)> = definitions
        .iter()
        .enumerate()
        .filter_map(|(index, d)| {
            let score = relevance(d, query, fields);
            (score > 0).then_some((score, index, d))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, d)| d.clone()).collect()
}

/// The search-popup result set: combo + description fields.
pub fn popup_results(
    definitions: &[HotkeyDefinition],
    window_id: &str,
    query: &str,
) -> Vec<HotkeyDefinition> {
    filter(definitions, window_id, query, SearchFields::Popup)
}

/// The list-level result set: scope is never applied, only text (which
/// also searches the scope field).
pub fn list_results(definitions: &[HotkeyDefinition], query: &str) -> Vec<HotkeyDefinition> {
    filter(definitions, UNKNOWN_WINDOW, query, SearchFields::List)
}
