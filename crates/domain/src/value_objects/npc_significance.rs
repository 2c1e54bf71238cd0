//! Named vs. generic NPC classification.
//!
//! A defeated NPC that matters to the story is kept (marked dead); a generic
//! enemy is removed. Whether an NPC "matters" is decided by an ordered table
//! of field predicates so new markers can be added without touching combat
//! cleanup.

use serde_json::{Map, Value};

/// Roles that do not, on their own, make an NPC narratively significant.
pub const GENERIC_ROLES: &[&str] = &["enemy", "minion"];

/// A single significance test over an `npc_data` record.
#[derive(Debug, Clone, Copy)]
pub struct SignificanceRule {
    pub name: &'static str,
    pub matches: fn(&Map<String, Value>) -> bool,
}

/// Rules checked in order; the first match classifies the NPC as named.
pub const NAMED_NPC_RULES: &[SignificanceRule] = &[
    SignificanceRule {
        name: "narrative_role",
        matches: has_narrative_role,
    },
    SignificanceRule {
        name: "backstory",
        matches: has_backstory,
    },
    SignificanceRule {
        name: "background",
        matches: has_background,
    },
    SignificanceRule {
        name: "is_important",
        matches: is_flagged_important,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcSignificance {
    /// Preserved as dead on defeat. `rule` names the predicate that matched.
    Named { rule: &'static str },
    /// Removed on defeat.
    Generic,
}

impl NpcSignificance {
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named { .. })
    }
}

/// Classify an NPC record with the default rule table.
pub fn classify_npc(record: &Value) -> NpcSignificance {
    classify_with(NAMED_NPC_RULES, record)
}

/// Classify an NPC record with a caller-supplied rule table.
pub fn classify_with(rules: &[SignificanceRule], record: &Value) -> NpcSignificance {
    let Some(fields) = record.as_object() else {
        return NpcSignificance::Generic;
    };

    rules
        .iter()
        .find(|rule| (rule.matches)(fields))
        .map(|rule| NpcSignificance::Named { rule: rule.name })
        .unwrap_or(NpcSignificance::Generic)
}

fn has_narrative_role(fields: &Map<String, Value>) -> bool {
    match fields.get("role") {
        Some(Value::String(role)) => {
            let role = role.trim();
            !role.is_empty()
                && !GENERIC_ROLES
                    .iter()
                    .any(|generic| role.eq_ignore_ascii_case(generic))
        }
        Some(other) => is_truthy(other),
        None => false,
    }
}

fn has_backstory(fields: &Map<String, Value>) -> bool {
    fields.get("backstory").is_some_and(is_truthy)
}

fn has_background(fields: &Map<String, Value>) -> bool {
    fields.get("background").is_some_and(is_truthy)
}

fn is_flagged_important(fields: &Map<String, Value>) -> bool {
    fields.get("is_important").is_some_and(is_truthy)
}

/// Loose truthiness: false, zero, null, and blank or empty containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
