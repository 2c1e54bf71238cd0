//! Deep merge of a change tree into a state document.
//!
//! Rules, per key:
//! - `Delete` removes the key; an absent key is a no-op.
//! - `Append` extends the list at the key, creating or replacing a non-list.
//! - `Nested` recurses into an existing object, creating it when missing.
//! - `Set` replaces the value wholesale. Lists are never merged by index.

use loresmith_domain::{json_kind, Change, ChangeTree, GameState};
use serde_json::{Map, Value};

/// Merge `changes` into a copy of `state`.
///
/// Pure: the input document is never modified. `merge(state, &ChangeTree::new())`
/// returns a document equal to `state`.
pub fn merge(state: &GameState, changes: &ChangeTree) -> GameState {
    let mut merged = state.clone();
    apply_tree(merged.as_map_mut(), changes, "");
    merged
}

/// Apply every change in `tree` to `target` in place.
pub(crate) fn apply_tree(target: &mut Map<String, Value>, tree: &ChangeTree, parent: &str) {
    for (key, change) in tree.iter() {
        apply_change(target, key, change, &child_path(parent, key));
    }
}

/// Apply a single change at `key` of `target`. `path` is only used for logs.
pub(crate) fn apply_change(target: &mut Map<String, Value>, key: &str, change: &Change, path: &str) {
    match change {
        Change::Delete => {
            if target.remove(key).is_some() {
                tracing::debug!(path = %path, "Deleted field");
            } else {
                tracing::debug!(path = %path, "Delete target absent, nothing to remove");
            }
        }
        Change::Append(items) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                tracing::warn!(
                    path = %path,
                    found = json_kind(slot),
                    "Append target is not a list, starting a new list"
                );
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(list) = slot {
                list.extend(items.iter().cloned());
            }
            tracing::debug!(path = %path, appended = items.len(), "Appended to list");
        }
        Change::Nested(subtree) => apply_nested(target, key, subtree, path),
        Change::Set(value) => {
            target.insert(key.to_string(), value.clone());
        }
    }
}

fn apply_nested(target: &mut Map<String, Value>, key: &str, subtree: &ChangeTree, path: &str) {
    if !target.contains_key(key) {
        if subtree.only_deletes() {
            tracing::debug!(path = %path, "Container absent, nothing to delete");
            return;
        }
        let mut created = Map::new();
        apply_tree(&mut created, subtree, path);
        target.insert(key.to_string(), Value::Object(created));
        return;
    }
    let Some(existing) = target.get_mut(key) else {
        return;
    };

    match existing {
        Value::Object(inner) => apply_tree(inner, subtree, path),
        other if subtree.only_deletes() => {
            tracing::warn!(
                path = %path,
                found = json_kind(other),
                "Deletion target is not an object, skipping"
            );
        }
        other => {
            tracing::debug!(
                path = %path,
                replaced = json_kind(other),
                "Replacing non-object with merged object"
            );
            let mut created = Map::new();
            apply_tree(&mut created, subtree, path);
            *other = Value::Object(created);
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
