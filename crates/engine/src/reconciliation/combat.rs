//! Defeated-combatant cleanup.
//!
//! After combat changes land, every combatant at or below zero hit points is
//! pulled out of `combat_state`. Story-relevant NPCs stay in `npc_data` marked
//! dead; generic enemies are removed from `npc_data` entirely. Friendly
//! combatants are never touched.

use std::collections::BTreeSet;

use loresmith_domain::{
    classify_with, coerce_hit_points, keys, CombatantKind, NpcSignificance, SignificanceRule,
    NAMED_NPC_RULES,
};
use serde::Serialize;
use serde_json::{Map, Value};

const STATUS: &str = "status";
const HP_CURRENT: &str = "hp_current";
const DEAD: &str = "dead";

/// What a cleanup pass did, by combatant name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Removed from `npc_data` (generic).
    pub purged: Vec<String>,
    /// Kept in `npc_data` and marked dead (named).
    pub preserved: Vec<String>,
    /// Removed from combat with no matching `npc_data` record.
    pub removed_from_combat: Vec<String>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.purged.is_empty() && self.preserved.is_empty() && self.removed_from_combat.is_empty()
    }

    /// Every name handled this pass.
    pub fn processed(&self) -> BTreeSet<String> {
        self.purged
            .iter()
            .chain(&self.preserved)
            .chain(&self.removed_from_combat)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CombatLifecycleManager {
    protected: Vec<CombatantKind>,
    rules: &'static [SignificanceRule],
}

impl Default for CombatLifecycleManager {
    fn default() -> Self {
        Self::new(CombatantKind::default_protected())
    }
}

impl CombatLifecycleManager {
    pub fn new(protected: Vec<CombatantKind>) -> Self {
        Self {
            protected,
            rules: NAMED_NPC_RULES,
        }
    }

    pub fn with_rules(mut self, rules: &'static [SignificanceRule]) -> Self {
        self.rules = rules;
        self
    }

    pub fn protected_kinds(&self) -> &[CombatantKind] {
        &self.protected
    }

    /// Remove defeated combatants from `state` in place. Idempotent.
    pub fn cleanup(&self, state: &mut Map<String, Value>) -> CleanupReport {
        let mut report = CleanupReport::default();

        let defeated = self.defeated_combatants(state);
        if defeated.is_empty() {
            return report;
        }

        for name in defeated {
            remove_from_combat(state, &name);

            match self.settle_npc_record(state, &name) {
                Some(NpcSignificance::Named { rule }) => {
                    tracing::info!(combatant = %name, rule, "Defeated named NPC preserved as dead");
                    report.preserved.push(name);
                }
                Some(NpcSignificance::Generic) => {
                    tracing::info!(combatant = %name, "Defeated generic NPC removed");
                    report.purged.push(name);
                }
                None => {
                    tracing::debug!(combatant = %name, "Defeated combatant has no npc_data record");
                    report.removed_from_combat.push(name);
                }
            }
        }

        report
    }

    fn defeated_combatants(&self, state: &Map<String, Value>) -> Vec<String> {
        let Some(combatants) = state
            .get(keys::COMBAT_STATE)
            .and_then(|combat| combat.get(keys::COMBATANTS))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };

        let player_names = player_character_names(state);
        let initiative = state
            .get(keys::COMBAT_STATE)
            .and_then(|combat| combat.get(keys::INITIATIVE_ORDER))
            .and_then(Value::as_array);

        combatants
            .iter()
            .filter(|(_, record)| {
                record
                    .get(HP_CURRENT)
                    .and_then(coerce_hit_points)
                    .is_some_and(|hp| hp <= 0)
            })
            .filter(|(name, record)| {
                let kind = declared_kind(name, record, initiative);
                if self.protected.contains(&kind) {
                    return false;
                }
                if kind.is_unknown() && player_names.contains(name.as_str()) {
                    tracing::debug!(combatant = %name, "Untyped combatant matches a player character, keeping");
                    return false;
                }
                true
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Mark the NPC dead or remove it, returning how it was classified.
    fn settle_npc_record(&self, state: &mut Map<String, Value>, name: &str) -> Option<NpcSignificance> {
        let npcs = state.get_mut(keys::NPC_DATA)?.as_object_mut()?;
        let key = npc_key(npcs, name)?;
        let significance = classify_with(self.rules, npcs.get(&key)?);

        match significance {
            NpcSignificance::Named { .. } => {
                if let Some(record) = npcs.get_mut(&key).and_then(Value::as_object_mut) {
                    record.insert(HP_CURRENT.to_string(), Value::from(0));
                    mark_dead(record);
                }
            }
            NpcSignificance::Generic => {
                npcs.remove(&key);
            }
        }
        Some(significance)
    }
}

/// The combat record's own `type`, falling back to its initiative entry.
fn declared_kind(name: &str, record: &Value, initiative: Option<&Vec<Value>>) -> CombatantKind {
    let kind = CombatantKind::from_record(record);
    if !kind.is_unknown() {
        return kind;
    }
    initiative
        .into_iter()
        .flatten()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
        .map(CombatantKind::from_record)
        .unwrap_or(CombatantKind::Unknown)
}

fn player_character_names(state: &Map<String, Value>) -> BTreeSet<&str> {
    let Some(players) = state.get(keys::PLAYER_CHARACTER_DATA).and_then(Value::as_object) else {
        return BTreeSet::new();
    };
    players
        .iter()
        .flat_map(|(key, record)| {
            let display = record.get("name").and_then(Value::as_str);
            std::iter::once(key.as_str()).chain(display)
        })
        .collect()
}

/// `npc_data` key for `name`: the key itself, or a record whose `name` field matches.
fn npc_key(npcs: &Map<String, Value>, name: &str) -> Option<String> {
    if npcs.contains_key(name) {
        return Some(name.to_string());
    }
    npcs.iter()
        .find(|(_, record)| record.get("name").and_then(Value::as_str) == Some(name))
        .map(|(key, _)| key.clone())
}

fn remove_from_combat(state: &mut Map<String, Value>, name: &str) {
    let Some(combat) = state.get_mut(keys::COMBAT_STATE).and_then(Value::as_object_mut) else {
        return;
    };
    if let Some(combatants) = combat.get_mut(keys::COMBATANTS).and_then(Value::as_object_mut) {
        combatants.remove(name);
    }
    if let Some(order) = combat.get_mut(keys::INITIATIVE_ORDER).and_then(Value::as_array_mut) {
        order.retain(|entry| entry.get("name").and_then(Value::as_str) != Some(name));
    }
}

fn mark_dead(record: &mut Map<String, Value>) {
    let mut statuses = match record.remove(STATUS) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(other) => vec![other],
    };
    if !statuses.iter().any(|status| status.as_str() == Some(DEAD)) {
        statuses.push(Value::String(DEAD.to_string()));
    }
    record.insert(STATUS.to_string(), Value::Array(statuses));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    fn battle() -> Map<String, Value> {
        map(json!({
            "player_character_data": {"Aria": {"hp_current": 9}},
            "npc_data": {
                "Marcus": {"role": "villain", "backstory": "Betrayed the order"},
                "Goblin Scout": {"role": "enemy"}
            },
            "combat_state": {
                "combatants": {
                    "Aria": {"hp_current": 9, "hp_max": 12, "type": "pc"},
                    "Marcus": {"hp_current": 0, "hp_max": 30, "type": "enemy"},
                    "Goblin Scout": {"hp_current": 0, "hp_max": 7, "type": "enemy"}
                },
                "initiative_order": [
                    {"name": "Marcus", "initiative": 18, "type": "enemy"},
                    {"name": "Aria", "initiative": 14, "type": "pc"},
                    {"name": "Goblin Scout", "initiative": 9, "type": "enemy"}
                ]
            }
        }))
    }

    #[test]
    fn named_npc_is_preserved_as_dead() {
        let mut state = battle();
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert!(state["combat_state"]["combatants"].get("Marcus").is_none());
        assert_eq!(state["npc_data"]["Marcus"]["status"], json!(["dead"]));
        assert_eq!(state["npc_data"]["Marcus"]["hp_current"], json!(0));
        assert_eq!(report.preserved, vec!["Marcus".to_string()]);
    }

    #[test]
    fn generic_npc_is_removed_everywhere() {
        let mut state = battle();
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert!(state["combat_state"]["combatants"].get("Goblin Scout").is_none());
        assert!(state["npc_data"].get("Goblin Scout").is_none());
        assert_eq!(
            state["combat_state"]["initiative_order"],
            json!([{"name": "Aria", "initiative": 14, "type": "pc"}])
        );
        assert_eq!(report.purged, vec!["Goblin Scout".to_string()]);
        assert_eq!(
            report.processed(),
            BTreeSet::from(["Goblin Scout".to_string(), "Marcus".to_string()])
        );
    }

    #[test]
    fn cleanup_is_idempotent() {
        let manager = CombatLifecycleManager::default();
        let mut state = battle();
        manager.cleanup(&mut state);
        let once = state.clone();

        let second = manager.cleanup(&mut state);
        assert!(second.is_empty());
        assert_eq!(state, once);
        assert_eq!(state["npc_data"]["Marcus"]["status"], json!(["dead"]));
    }

    #[test]
    fn dead_tag_is_not_duplicated() {
        let mut state = map(json!({
            "npc_data": {"Marcus": {"is_important": true, "status": ["wounded", "dead"]}},
            "combat_state": {"combatants": {"Marcus": {"hp_current": -3, "type": "npc"}}}
        }));
        CombatLifecycleManager::default().cleanup(&mut state);
        assert_eq!(state["npc_data"]["Marcus"]["status"], json!(["wounded", "dead"]));
    }

    #[test]
    fn pc_missing_from_initiative_is_never_removed() {
        let mut state = map(json!({
            "combat_state": {
                "combatants": {"Aria": {"hp_current": 0, "type": "pc"}},
                "initiative_order": []
            }
        }));
        let before = state.clone();
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert!(report.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn untyped_player_character_is_protected() {
        let mut state = map(json!({
            "player_character_data": {"pc_1": {"name": "Aria"}},
            "combat_state": {"combatants": {"Aria": {"hp_current": 0}}}
        }));
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert!(report.is_empty());
        assert!(state["combat_state"]["combatants"].get("Aria").is_some());
    }

    #[test]
    fn untyped_combatant_uses_initiative_type() {
        let mut state = map(json!({
            "combat_state": {
                "combatants": {"Bram": {"hp_current": 0}, "Rat": {"hp_current": 0}},
                "initiative_order": [
                    {"name": "Bram", "initiative": 11, "type": "ally"},
                    {"name": "Rat", "initiative": 3}
                ]
            }
        }));
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert_eq!(report.removed_from_combat, vec!["Rat".to_string()]);
        assert!(state["combat_state"]["combatants"].get("Bram").is_some());
    }

    #[test]
    fn bare_string_status_is_wrapped() {
        let mut state = map(json!({
            "npc_data": {"Captain Vell": {"background": "Harbor watch", "status": "wounded"}},
            "combat_state": {"combatants": {"Captain Vell": {"hp_current": "0", "type": "enemy"}}}
        }));
        CombatLifecycleManager::default().cleanup(&mut state);
        assert_eq!(state["npc_data"]["Captain Vell"]["status"], json!(["wounded", "dead"]));
    }

    #[test]
    fn non_numeric_hit_points_mean_not_defeated() {
        let mut state = map(json!({
            "npc_data": {"Ghost": {"role": "enemy"}},
            "combat_state": {"combatants": {"Ghost": {"hp_current": "incorporeal", "type": "enemy"}}}
        }));
        let before = state.clone();
        assert!(CombatLifecycleManager::default().cleanup(&mut state).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn npc_record_is_found_by_name_field() {
        let mut state = map(json!({
            "npc_data": {"npc_17": {"name": "Bandit", "role": "minion"}},
            "combat_state": {"combatants": {"Bandit": {"hp_current": 0, "type": "minion"}}}
        }));
        let report = CombatLifecycleManager::default().cleanup(&mut state);

        assert_eq!(report.purged, vec!["Bandit".to_string()]);
        assert_eq!(state["npc_data"], json!({}));
    }

    #[test]
    fn custom_protected_kinds_are_respected() {
        let mut state = map(json!({
            "combat_state": {"combatants": {"Wolf": {"hp_current": 0, "type": "companion"}}}
        }));
        let manager = CombatLifecycleManager::new(vec![
            CombatantKind::Pc,
            CombatantKind::Ally,
            CombatantKind::Other("companion".into()),
        ]);
        assert!(manager.cleanup(&mut state).is_empty());
    }
}
