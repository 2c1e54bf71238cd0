//! The per-campaign game state document.
//!
//! The document is deliberately untyped: the narrator proposes arbitrary
//! fields and the reconciler must accept them. Only a handful of top-level
//! keys carry invariants, and those are named in [`keys`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Well-known top-level keys of the game state document.
pub mod keys {
    pub const PLAYER_CHARACTER_DATA: &str = "player_character_data";
    pub const NPC_DATA: &str = "npc_data";
    pub const COMBAT_STATE: &str = "combat_state";
    pub const COMBATANTS: &str = "combatants";
    pub const INITIATIVE_ORDER: &str = "initiative_order";
    pub const ACTIVE_MISSIONS: &str = "active_missions";
    pub const COMPLETED_MISSIONS: &str = "completed_missions";
    pub const MISSION_ID: &str = "mission_id";
    pub const CUSTOM_CAMPAIGN_STATE: &str = "custom_campaign_state";
    pub const WORLD_DATA: &str = "world_data";
    pub const DEBUG_MODE: &str = "debug_mode";
}

/// A campaign's nested state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState(Map<String, Value>);

impl GameState {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build a state from an arbitrary JSON value. Only objects are documents.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::shape("object", json_kind(&other))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Follow a dotted path (`combat_state.combatants.Marcus`) through nested objects.
    pub fn pointer(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let first = segments.next()?;
        segments.try_fold(self.0.get(first)?, |current, segment| {
            current.as_object()?.get(segment)
        })
    }
}

impl From<Map<String, Value>> for GameState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Short name of a JSON value's type, for logs and errors.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
