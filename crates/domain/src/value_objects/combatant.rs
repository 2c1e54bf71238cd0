//! Combatant classification and hit-point coercion.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// The declared side of a combatant (`type` field of a combat record).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CombatantKind {
    Pc,
    Ally,
    Enemy,
    Minion,
    Npc,
    /// Any other non-empty declaration, lowercased.
    Other(String),
    /// Missing, empty, or non-string `type`.
    Unknown,
}

impl CombatantKind {
    /// Read the `type` field of a combat or initiative record.
    pub fn from_record(record: &Value) -> Self {
        record
            .get("type")
            .and_then(Value::as_str)
            .map(|raw| raw.parse().unwrap_or(Self::Unknown))
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pc => "pc",
            Self::Ally => "ally",
            Self::Enemy => "enemy",
            Self::Minion => "minion",
            Self::Npc => "npc",
            Self::Other(other) => other.as_str(),
            Self::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The default set of kinds that combat cleanup must never purge.
    pub fn default_protected() -> Vec<Self> {
        vec![Self::Pc, Self::Ally]
    }
}

impl FromStr for CombatantKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "" => Self::Unknown,
            "pc" => Self::Pc,
            "ally" => Self::Ally,
            "enemy" => Self::Enemy,
            "minion" => Self::Minion,
            "npc" => Self::Npc,
            _ => Self::Other(normalized),
        })
    }
}

impl fmt::Display for CombatantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerce an `hp_current` value to an integer.
///
/// Integers pass through, floats truncate toward zero, and numeric strings
/// are parsed. Anything else yields `None`, which callers treat as "not
/// defeated".
pub fn coerce_hit_points(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}
