//! Dotted-path assignment parser for operator directives.
//!
//! Turns text like
//!
//! ```text
//! player_character_data.Aria.hp_current = 7
//! player_character_data.Aria.inventory.append = "rope"
//! world_data.weather = stormy
//! ```
//!
//! into a nested change tree:
//!
//! ```text
//! {"player_character_data": {"Aria": {"hp_current": 7, "inventory": {"append": ["rope"]}}},
//!  "world_data": {"weather": "stormy"}}
//! ```
//!
//! Bad lines are skipped; parsing never fails as a whole.

use std::sync::LazyLock;

use loresmith_domain::APPEND_KEY;
use regex_lite::Regex;
use serde_json::{Map, Value};

/// A value that is not JSON but carries no JSON structure either (`stormy`, `Long Sword`).
static BAREWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^{}\[\]"]+$"#).expect("valid regex"));

/// Parse `path = value` lines into a nested change tree.
pub fn parse_path_assignments(text: &str) -> Map<String, Value> {
    let mut tree = Map::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let Some((raw_path, raw_value)) = line.split_once('=') else {
            continue;
        };

        let path = raw_path.trim();
        let raw_value = raw_value.trim();
        if path.is_empty() || raw_value.is_empty() {
            tracing::debug!(line = line_no, "Skipping assignment with empty path or value");
            continue;
        }

        let Some(value) = parse_value(raw_value) else {
            tracing::warn!(
                line = line_no,
                path = %path,
                value = %raw_value,
                "Skipping assignment with malformed JSON value"
            );
            continue;
        };

        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            tracing::warn!(line = line_no, path = %path, "Skipping assignment with empty path segment");
            continue;
        }

        match segments.split_last() {
            Some((&last, parents)) if last == APPEND_KEY && !parents.is_empty() => {
                push_append(&mut tree, parents, value);
            }
            _ => set_path(&mut tree, &segments, value),
        }
    }

    tree
}

/// Parse a right-hand side as JSON, falling back to a plain string for barewords.
fn parse_value(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value),
        Err(_) if BAREWORD_RE.is_match(raw) => Some(Value::String(raw.to_string())),
        Err(_) => None,
    }
}

/// Walk (creating as needed) the objects named by `segments` and return the last one.
fn descend<'a>(
    tree: &'a mut Map<String, Value>,
    segments: &[&str],
) -> Option<&'a mut Map<String, Value>> {
    let mut current = tree;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut()?;
    }
    Some(current)
}

fn set_path(tree: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    if let Some(parent) = descend(tree, parents) {
        parent.insert(last.to_string(), value);
    }
}

fn push_append(tree: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let Some(parent) = descend(tree, parents) else {
        return;
    };
    let instruction = parent
        .entry(last.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    let pending = instruction
        .as_object_mut()
        .and_then(|map| map.get_mut(APPEND_KEY))
        .and_then(Value::as_array_mut);

    match pending {
        Some(items) => items.push(value),
        None => {
            let mut fresh = Map::new();
            fresh.insert(APPEND_KEY.to_string(), Value::Array(vec![value]));
            *instruction = Value::Object(fresh);
        }
    }
}
