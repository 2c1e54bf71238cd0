//! Engine settings loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `LORESMITH_STATE_DIR` - Directory for per-campaign state files (default: `./campaign_states`)
//! - `LORESMITH_LEDGER_KEYS` - Comma-separated mission collection keys
//!   (default: `active_missions,completed_missions`)
//! - `LORESMITH_PROTECTED_COMBATANT_TYPES` - Comma-separated combatant types that
//!   cleanup never purges (default: `pc,ally`)
//! - `LORESMITH_DELETE_LITERAL` - Extra string spelling of the deletion sentinel, recognized
//!   alongside `__DELETE__` (default: `__DELETE__`)

use std::path::PathBuf;

use loresmith_domain::{keys, CombatantKind, DELETE_LITERAL};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub state_dir: PathBuf,
    pub ledger_keys: Vec<String>,
    pub protected_combatant_types: Vec<CombatantKind>,
    pub delete_literal: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./campaign_states"),
            ledger_keys: vec![
                keys::ACTIVE_MISSIONS.to_string(),
                keys::COMPLETED_MISSIONS.to_string(),
            ],
            protected_combatant_types: CombatantKind::default_protected(),
            delete_literal: DELETE_LITERAL.to_string(),
        }
    }
}

impl EngineSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ledger_keys = env_list("LORESMITH_LEDGER_KEYS")
            .unwrap_or(defaults.ledger_keys);
        let protected_combatant_types = env_list("LORESMITH_PROTECTED_COMBATANT_TYPES")
            .map(|types| {
                types
                    .iter()
                    .map(|raw| raw.parse().unwrap_or(CombatantKind::Unknown))
                    .filter(|kind: &CombatantKind| !kind.is_unknown())
                    .collect::<Vec<_>>()
            })
            .filter(|kinds| !kinds.is_empty())
            .unwrap_or(defaults.protected_combatant_types);

        Self {
            state_dir: env_or("LORESMITH_STATE_DIR", defaults.state_dir),
            ledger_keys,
            protected_combatant_types,
            delete_literal: env_or("LORESMITH_DELETE_LITERAL", defaults.delete_literal),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Comma-separated list; `None` when unset or empty after trimming.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = parse_list(&raw);
    (!items.is_empty()).then_some(items)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
