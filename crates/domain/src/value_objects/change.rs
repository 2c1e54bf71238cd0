//! Change proposals as a tagged variant.
//!
//! Narrator and operator proposals arrive as untyped JSON where one value can
//! mean "set", "delete", "append to list", or "descend into this object".
//! [`Change::classify`] performs that dispatch once so merge code can match
//! exhaustively instead of sniffing shapes at every branch.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::error::DomainError;
use crate::game_state::json_kind;

/// The string spelling of the deletion sentinel.
pub const DELETE_LITERAL: &str = "__DELETE__";

/// Key that marks an object as a list-append instruction.
pub const APPEND_KEY: &str = "append";

/// The storage platform's own "delete this field" marker, as it appears
/// once a proposal has been decoded into JSON.
pub fn platform_delete_marker() -> Value {
    json!({ "__sentinel__": "DELETE_FIELD" })
}

/// Every spelling that means "remove this field".
///
/// [`DELETE_LITERAL`] is always recognized. Extra string spellings and the
/// storage platform's marker are interchangeable with it; all classify to
/// [`Change::Delete`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionMarkers {
    literals: Vec<String>,
    platform: Vec<Value>,
}

impl Default for DeletionMarkers {
    fn default() -> Self {
        Self::new().with_platform_marker(platform_delete_marker())
    }
}

impl DeletionMarkers {
    /// Markers recognizing only [`DELETE_LITERAL`].
    pub fn new() -> Self {
        Self {
            literals: vec![DELETE_LITERAL.to_string()],
            platform: Vec::new(),
        }
    }

    /// Also recognize `literal` as a string spelling.
    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        let literal = literal.into();
        if !self.literals.contains(&literal) {
            self.literals.push(literal);
        }
        self
    }

    /// Also recognize `marker` as a deletion.
    pub fn with_platform_marker(mut self, marker: Value) -> Self {
        if !self.platform.contains(&marker) {
            self.platform.push(marker);
        }
        self
    }

    /// The canonical spelling used when rendering a deletion back to JSON.
    pub fn literal(&self) -> &str {
        DELETE_LITERAL
    }

    pub fn is_delete(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.literals.iter().any(|literal| literal == s),
            other => self.platform.iter().any(|marker| marker == other),
        }
    }
}

/// One proposed change to a single key.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Remove the key from its container.
    Delete,
    /// Extend the list at this key, creating it if needed.
    Append(Vec<Value>),
    /// Merge into the object at this key.
    Nested(ChangeTree),
    /// Replace the value wholesale.
    Set(Value),
}

impl Change {
    pub fn classify(value: Value, markers: &DeletionMarkers) -> Self {
        if markers.is_delete(&value) {
            return Self::Delete;
        }

        match value {
            Value::Object(mut map) => match map.remove(APPEND_KEY) {
                Some(Value::Array(items)) => Self::Append(items),
                Some(single) => Self::Append(vec![single]),
                None => Self::Nested(ChangeTree::from_map(map, markers)),
            },
            other => Self::Set(other),
        }
    }

    /// True when applying this change can only remove data.
    pub fn only_deletes(&self) -> bool {
        match self {
            Self::Delete => true,
            Self::Nested(tree) => tree.only_deletes(),
            Self::Append(_) | Self::Set(_) => false,
        }
    }

    /// Render back to the JSON shape it was classified from.
    pub fn to_value(&self, markers: &DeletionMarkers) -> Value {
        match self {
            Self::Delete => Value::String(markers.literal().to_string()),
            Self::Append(items) => json!({ APPEND_KEY: items }),
            Self::Nested(tree) => tree.to_value(markers),
            Self::Set(value) => value.clone(),
        }
    }
}

/// A nested set of changes keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTree {
    entries: BTreeMap<String, Change>,
}

impl ChangeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>, markers: &DeletionMarkers) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| (key, Change::classify(value, markers)))
            .collect();
        Self { entries }
    }

    /// Classify a whole proposal. Only objects are change trees.
    pub fn from_value(value: Value, markers: &DeletionMarkers) -> Result<Self, DomainError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map, markers)),
            other => Err(DomainError::shape("object", json_kind(&other))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, change: Change) -> Option<Change> {
        self.entries.insert(key.into(), change)
    }

    pub fn get(&self, key: &str) -> Option<&Change> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A non-empty tree whose every leaf is a deletion.
    pub fn only_deletes(&self) -> bool {
        !self.entries.is_empty() && self.entries.values().all(Change::only_deletes)
    }

    pub fn to_value(&self, markers: &DeletionMarkers) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, change)| (key.clone(), change.to_value(markers)))
                .collect(),
        )
    }
}

impl IntoIterator for ChangeTree {
    type Item = (String, Change);
    type IntoIter = std::collections::btree_map::IntoIter<String, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
