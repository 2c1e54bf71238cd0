//! Operator directive grammar.
//!
//! ```text
//! GOD_MODE_SET:
//! player_character_data.Aria.hp_current = 7
//! world_data.weather = stormy
//! ```
//!
//! or the whole-object form `GOD_MODE_UPDATE_STATE:{"world_data": {...}}`.
//!
//! The line form is tolerant: bad lines are skipped by the path parser. The
//! whole-object form is all-or-nothing: a payload that does not parse is
//! rejected before anything is merged.

use std::sync::LazyLock;

use loresmith_domain::json_kind;
use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::reconciliation::parse_path_assignments;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*GOD_MODE_(SET|UPDATE_STATE)\s*:(.*)$").expect("valid regex")
});

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("GOD_MODE_UPDATE_STATE payload is empty")]
    EmptyPayload,
    #[error("GOD_MODE_UPDATE_STATE payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("GOD_MODE_UPDATE_STATE payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Set,
    UpdateState,
}

impl DirectiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "GOD_MODE_SET",
            Self::UpdateState => "GOD_MODE_UPDATE_STATE",
        }
    }
}

/// A parsed directive, carrying the change tree to reconcile.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub changes: Map<String, Value>,
}

/// Whether `text` starts with a directive prefix.
pub fn is_directive(text: &str) -> bool {
    DIRECTIVE_RE.is_match(text)
}

/// Parse operator text.
///
/// Returns `Ok(None)` when `text` is not a directive at all.
pub fn parse_directive(text: &str) -> Result<Option<Directive>, DirectiveError> {
    let Some(captures) = DIRECTIVE_RE.captures(text) else {
        return Ok(None);
    };
    let body = captures.get(2).map_or("", |m| m.as_str());

    let directive = match captures.get(1).map(|m| m.as_str()) {
        Some("UPDATE_STATE") => Directive {
            kind: DirectiveKind::UpdateState,
            changes: parse_whole_object(body)?,
        },
        _ => Directive {
            kind: DirectiveKind::Set,
            changes: parse_path_assignments(body),
        },
    };
    Ok(Some(directive))
}

fn parse_whole_object(body: &str) -> Result<Map<String, Value>, DirectiveError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(DirectiveError::EmptyPayload);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(changes)) => Ok(changes),
        Ok(other) => Err(DirectiveError::NotAnObject(json_kind(&other))),
        Err(e) => Err(DirectiveError::InvalidJson(e.to_string())),
    }
}
