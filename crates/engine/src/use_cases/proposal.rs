//! Structured state-update block in narrator responses.
//!
//! The narrator appends its proposed changes to the story text:
//!
//! ```text
//! The goblin falls.
//! [STATE_UPDATES_PROPOSED]
//! {"combat_state": {"combatants": {"Goblin Scout": {"hp_current": 0}}}}
//! [END_STATE_UPDATES_PROPOSED]
//! ```

use std::sync::LazyLock;

use loresmith_domain::json_kind;
use regex_lite::Regex;
use serde_json::{Map, Value};

static PROPOSAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[STATE_UPDATES_PROPOSED\](.*?)\[END_STATE_UPDATES_PROPOSED\]")
        .expect("valid regex")
});

/// The first proposal block's change tree.
///
/// Missing, empty, malformed, or non-object blocks yield `None`; malformed
/// ones are logged.
pub fn extract_state_updates(response: &str) -> Option<Map<String, Value>> {
    let body = PROPOSAL_RE.captures(response)?.get(1)?.as_str();
    let body = strip_code_fence(body.trim());
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(changes)) => Some(changes),
        Ok(other) => {
            tracing::warn!(found = json_kind(&other), "State update block is not an object, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "State update block is not valid JSON, ignoring");
            None
        }
    }
}

/// The response with every proposal block removed.
pub fn strip_state_updates(response: &str) -> String {
    PROPOSAL_RE.replace_all(response, "").trim().to_string()
}

fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.split_once('\n').map_or("", |(_, after_lang)| after_lang);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
