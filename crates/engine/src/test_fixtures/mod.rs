//! Test fixtures loader for JSON fixture files and common test helpers.
//!
//! Fixtures live in `test_data/` next to the crate manifest.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::campaigns;
//!
//! #[test]
//! fn marcus_is_in_combat() {
//!     let state = campaigns::ambush_at_the_ford();
//!     // ... test logic
//! }
//! ```

use std::path::PathBuf;

use loresmith_domain::GameState;
use serde_json::{Map, Value};

// =============================================================================
// Fixture Loading
// =============================================================================

/// Load a JSON fixture from test_data/ directory.
///
/// # Panics
///
/// Panics if the fixture file cannot be read or parsed.
pub fn load_fixture<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(path);
    let content = std::fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture '{}': {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!(
            "Failed to parse fixture '{}': {}",
            fixture_path.display(),
            e
        )
    })
}

/// Unwrap a `json!` object literal into a map.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =============================================================================
// Campaign States
// =============================================================================

pub mod campaigns {
    use super::*;

    /// Mid-combat party: two PCs and an ally against a named villain and two goblins.
    pub fn ambush_at_the_ford() -> GameState {
        load_fixture("campaigns/ambush_at_the_ford.json")
    }

    /// Older save where `active_missions` was written as an id-keyed object.
    pub fn legacy_mission_dict() -> GameState {
        load_fixture("campaigns/legacy_mission_dict.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_load() {
        let ambush = campaigns::ambush_at_the_ford();
        assert!(ambush.pointer("combat_state.combatants.Marcus").is_some());

        let legacy = campaigns::legacy_mission_dict();
        assert!(legacy.get("active_missions").is_some_and(Value::is_object));
    }
}
