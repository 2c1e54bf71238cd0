//! Mission ledger and list-shape repair.
//!
//! The narrator sometimes emits a collection as an object keyed by id
//! (`{"quest1": {...}}`) instead of the canonical list of records. These
//! functions fold such objects into the list form, merging into records that
//! already exist, and keep the `active_missions` / `completed_missions` pair
//! initialized.

use std::collections::{BTreeMap, BTreeSet};

use loresmith_domain::{json_kind, keys, DeletionMarkers};
use serde::Serialize;
use serde_json::{Map, Value};

/// What happened to one ledger key during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "repair", rename_all = "snake_case")]
pub enum LedgerRepair {
    /// Value was already a list.
    AlreadyList { key: String },
    /// An id-keyed object was folded into the list.
    ConvertedFromObject { key: String, records: usize },
    /// Unsupported shape replaced with an empty list.
    Coerced { key: String, found: &'static str },
    /// List records without a `mission_id` were given one.
    AssignedIds { key: String, count: usize },
    /// Numeric or boolean ids were rewritten as strings.
    StringifiedIds { key: String, count: usize },
    /// Later records sharing an id were folded into the first one.
    MergedDuplicates { key: String, count: usize },
    /// `completed_missions` was created alongside `active_missions`.
    InitializedCompleted,
}

/// Outcome of [`process_mission_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionUpsert {
    Merged { index: usize },
    Appended,
}

/// Ensure `state[key]` is a list, replacing anything else with `[]`.
pub fn initialize_missions_list(state: &mut Map<String, Value>, key: &str) {
    match state.get(key) {
        Some(Value::Array(_)) => {}
        Some(other) => {
            tracing::debug!(key = %key, found = json_kind(other), "Initializing mission list over non-list value");
            state.insert(key.to_string(), Value::Array(Vec::new()));
        }
        None => {
            state.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }
}

/// Position of the record with `mission_id`, skipping non-object and id-less entries.
pub fn find_existing_mission_index(missions: &[Value], mission_id: &str) -> Option<usize> {
    missions.iter().position(|entry| {
        entry
            .as_object()
            .and_then(mission_id_of)
            .is_some_and(|id| id == mission_id)
    })
}

/// Remove the record for `mission_id` from the list at `key`.
///
/// Returns whether a record was removed.
pub fn remove_mission(state: &mut Map<String, Value>, key: &str, mission_id: &str) -> bool {
    let Some(Value::Array(missions)) = state.get_mut(key) else {
        return false;
    };

    match find_existing_mission_index(missions, mission_id) {
        Some(index) => {
            missions.remove(index);
            tracing::info!(key = %key, mission_id = %mission_id, index, "Removed mission");
            true
        }
        None => {
            tracing::debug!(key = %key, mission_id = %mission_id, "Deletion for unknown mission ignored");
            false
        }
    }
}

/// Merge `data` into the record for `mission_id`, or append a new record.
///
/// Fields absent from `data` survive on an existing record. Fields whose value
/// is a deletion sentinel are removed. The stored `mission_id` is always
/// `mission_id`.
pub fn process_mission_data(
    state: &mut Map<String, Value>,
    key: &str,
    mission_id: &str,
    data: &Map<String, Value>,
    markers: &DeletionMarkers,
) -> MissionUpsert {
    initialize_missions_list(state, key);
    let Some(Value::Array(missions)) = state.get_mut(key) else {
        return MissionUpsert::Appended;
    };

    match find_existing_mission_index(missions, mission_id) {
        Some(index) => {
            if let Some(record) = missions.get_mut(index).and_then(Value::as_object_mut) {
                shallow_merge(record, data, markers);
                record.insert(keys::MISSION_ID.to_string(), Value::String(mission_id.to_string()));
            }
            tracing::info!(key = %key, mission_id = %mission_id, index, "Updated existing mission");
            MissionUpsert::Merged { index }
        }
        None => {
            let mut record = Map::new();
            shallow_merge(&mut record, data, markers);
            record.insert(keys::MISSION_ID.to_string(), Value::String(mission_id.to_string()));
            missions.push(Value::Object(record));
            tracing::info!(key = %key, mission_id = %mission_id, "Added new mission");
            MissionUpsert::Appended
        }
    }
}

/// Fold an id-keyed object of missions into the list at `key`.
///
/// An entry whose value is a deletion sentinel removes that mission. Other
/// non-object entries are skipped individually. Returns how many records were
/// merged, appended or removed.
pub fn handle_missions_dict_conversion(
    state: &mut Map<String, Value>,
    key: &str,
    missions: &Map<String, Value>,
    markers: &DeletionMarkers,
) -> usize {
    initialize_missions_list(state, key);

    let mut processed = 0;
    for (mission_id, value) in missions {
        if markers.is_delete(value) {
            if remove_mission(state, key, mission_id) {
                processed += 1;
            }
            continue;
        }
        match value {
            Value::Object(data) => {
                process_mission_data(state, key, mission_id, data, markers);
                processed += 1;
            }
            other => {
                tracing::warn!(
                    key = %key,
                    mission_id = %mission_id,
                    found = json_kind(other),
                    "Skipping mission entry that is not an object"
                );
            }
        }
    }
    processed
}

/// Put `value` at `key` in canonical list form, then make sure the ledger pair exists.
///
/// Objects are folded in with [`handle_missions_dict_conversion`]; lists are
/// stored as-is; anything else becomes `[]`. The `completed_missions`
/// initialization runs after every branch.
pub fn handle_active_missions_conversion(
    state: &mut Map<String, Value>,
    key: &str,
    value: &Value,
    markers: &DeletionMarkers,
) -> Vec<LedgerRepair> {
    let mut repairs = Vec::with_capacity(2);

    match value {
        Value::Array(_) => {
            if state.get(key) != Some(value) {
                state.insert(key.to_string(), value.clone());
            }
            repairs.push(LedgerRepair::AlreadyList {
                key: key.to_string(),
            });
        }
        Value::Object(missions) => {
            tracing::warn!(
                key = %key,
                entries = missions.len(),
                "Mission collection arrived as an object, converting to list"
            );
            let records = handle_missions_dict_conversion(state, key, missions, markers);
            repairs.push(LedgerRepair::ConvertedFromObject {
                key: key.to_string(),
                records,
            });
        }
        other => {
            tracing::error!(
                key = %key,
                found = json_kind(other),
                "Mission collection has unsupported type, resetting to empty list"
            );
            state.insert(key.to_string(), Value::Array(Vec::new()));
            repairs.push(LedgerRepair::Coerced {
                key: key.to_string(),
                found: json_kind(other),
            });
        }
    }

    if ensure_completed_missions(state) {
        repairs.push(LedgerRepair::InitializedCompleted);
    }
    repairs
}

/// Create `completed_missions = []` when `active_missions` exists in any form
/// and `completed_missions` does not. Returns whether it was created.
pub fn ensure_completed_missions(state: &mut Map<String, Value>) -> bool {
    if state.contains_key(keys::ACTIVE_MISSIONS) && !state.contains_key(keys::COMPLETED_MISSIONS) {
        state.insert(keys::COMPLETED_MISSIONS.to_string(), Value::Array(Vec::new()));
        tracing::info!("Initialized completed_missions alongside active_missions");
        return true;
    }
    false
}

/// Counts from one [`normalize_mission_ids`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdRepairs {
    pub stringified: usize,
    pub merged: usize,
    pub assigned: usize,
}

/// Give every object record in the list at `key` a unique string `mission_id`.
///
/// Numeric and boolean ids are kept as their string form. A record repeating
/// an earlier id is shallow-merged into that earlier record and dropped.
/// Missing ids become `mission-<n>` with the first unused `n`.
pub fn normalize_mission_ids(
    state: &mut Map<String, Value>,
    key: &str,
    markers: &DeletionMarkers,
) -> IdRepairs {
    let mut repairs = IdRepairs::default();
    let Some(Value::Array(missions)) = state.get_mut(key) else {
        return repairs;
    };

    for record in missions.iter_mut().filter_map(Value::as_object_mut) {
        let stringified = match record.get(keys::MISSION_ID) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => continue,
        };
        tracing::warn!(key = %key, mission_id = %stringified, "Stored non-string mission id as string");
        record.insert(keys::MISSION_ID.to_string(), Value::String(stringified));
        repairs.stringified += 1;
    }

    let mut first_seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut kept: Vec<Value> = Vec::with_capacity(missions.len());
    for entry in std::mem::take(missions) {
        let Some(id) = entry.as_object().and_then(mission_id_of).map(str::to_string) else {
            kept.push(entry);
            continue;
        };
        match first_seen.get(&id).copied() {
            Some(index) => {
                if let (Some(target), Value::Object(data)) =
                    (kept.get_mut(index).and_then(Value::as_object_mut), &entry)
                {
                    shallow_merge(target, data, markers);
                }
                tracing::warn!(key = %key, mission_id = %id, "Merged duplicate mission record");
                repairs.merged += 1;
            }
            None => {
                first_seen.insert(id, kept.len());
                kept.push(entry);
            }
        }
    }

    let mut next = 1usize;
    for record in kept.iter_mut().filter_map(Value::as_object_mut) {
        if mission_id_of(record).is_some() {
            continue;
        }
        let id = loop {
            let candidate = format!("mission-{next}");
            next += 1;
            if !first_seen.contains_key(&candidate) {
                break candidate;
            }
        };
        tracing::warn!(key = %key, mission_id = %id, "Assigned id to mission without one");
        record.insert(keys::MISSION_ID.to_string(), Value::String(id.clone()));
        first_seen.insert(id, 0);
        repairs.assigned += 1;
    }

    *missions = kept;
    repairs
}

fn mission_id_of(record: &Map<String, Value>) -> Option<&str> {
    record
        .get(keys::MISSION_ID)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Whether any record lacks a string id or repeats an earlier one.
fn ids_need_repair(missions: &[Value]) -> bool {
    let mut seen = BTreeSet::new();
    missions
        .iter()
        .filter_map(Value::as_object)
        .any(|record| match mission_id_of(record) {
            Some(id) => !seen.insert(id),
            None => true,
        })
}

fn shallow_merge(record: &mut Map<String, Value>, data: &Map<String, Value>, markers: &DeletionMarkers) {
    for (field, value) in data {
        if markers.is_delete(value) {
            record.remove(field);
        } else {
            record.insert(field.clone(), without_deletions(value, markers));
        }
    }
}

/// Copy of `value` with sentinel-valued object entries dropped at every depth.
fn without_deletions(value: &Value, markers: &DeletionMarkers) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, inner)| !markers.is_delete(inner))
                .map(|(field, inner)| (field.clone(), without_deletions(inner, markers)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Ledger hooks run by the reconciler for the configured collection keys.
#[derive(Debug, Clone)]
pub struct MissionLedger {
    collection_keys: Vec<String>,
    markers: DeletionMarkers,
}

impl Default for MissionLedger {
    fn default() -> Self {
        Self::new(
            vec![
                keys::ACTIVE_MISSIONS.to_string(),
                keys::COMPLETED_MISSIONS.to_string(),
            ],
            DeletionMarkers::default(),
        )
    }
}

impl MissionLedger {
    pub fn new(collection_keys: Vec<String>, markers: DeletionMarkers) -> Self {
        Self {
            collection_keys,
            markers,
        }
    }

    pub fn collection_keys(&self) -> &[String] {
        &self.collection_keys
    }

    pub fn tracks(&self, key: &str) -> bool {
        self.collection_keys.iter().any(|tracked| tracked == key)
    }

    /// Apply an id-keyed object proposal for a tracked key, merging into the existing list.
    pub fn apply_proposal(
        &self,
        state: &mut Map<String, Value>,
        key: &str,
        proposal: &Value,
    ) -> Vec<LedgerRepair> {
        handle_active_missions_conversion(state, key, proposal, &self.markers)
    }

    /// Whether any tracked collection is out of canonical shape.
    pub fn needs_repair(&self, state: &Map<String, Value>) -> bool {
        let malformed = self.collection_keys.iter().any(|key| match state.get(key) {
            Some(Value::Array(missions)) => ids_need_repair(missions),
            Some(_) => true,
            None => false,
        });
        let unpaired = state.contains_key(keys::ACTIVE_MISSIONS)
            && !state.contains_key(keys::COMPLETED_MISSIONS);
        malformed || unpaired
    }

    /// Repair every tracked collection present in `state`.
    pub fn normalize(&self, state: &mut Map<String, Value>) -> Vec<LedgerRepair> {
        let mut repairs = Vec::new();

        for key in &self.collection_keys {
            let Some(current) = state.get(key) else {
                continue;
            };
            if !current.is_array() {
                let current = current.clone();
                repairs.extend(
                    handle_active_missions_conversion(state, key, &current, &self.markers)
                        .into_iter()
                        .filter(|repair| !matches!(repair, LedgerRepair::InitializedCompleted)),
                );
            }
            let ids = normalize_mission_ids(state, key, &self.markers);
            if ids.stringified > 0 {
                repairs.push(LedgerRepair::StringifiedIds {
                    key: key.clone(),
                    count: ids.stringified,
                });
            }
            if ids.merged > 0 {
                repairs.push(LedgerRepair::MergedDuplicates {
                    key: key.clone(),
                    count: ids.merged,
                });
            }
            if ids.assigned > 0 {
                repairs.push(LedgerRepair::AssignedIds {
                    key: key.clone(),
                    count: ids.assigned,
                });
            }
        }

        if ensure_completed_missions(state) {
            repairs.push(LedgerRepair::InitializedCompleted);
        }
        repairs
    }
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

    fn markers() -> DeletionMarkers {
        DeletionMarkers::default()
    }

    #[test]
    fn initialize_replaces_non_lists_only() {
        let mut state = map(json!({"active_missions": [{"mission_id": "q1"}], "completed_missions": "oops"}));
        initialize_missions_list(&mut state, "active_missions");
        initialize_missions_list(&mut state, "completed_missions");
        initialize_missions_list(&mut state, "side_quests");

        assert_eq!(state["active_missions"], json!([{"mission_id": "q1"}]));
        assert_eq!(state["completed_missions"], json!([]));
        assert_eq!(state["side_quests"], json!([]));
    }

    #[test]
    fn find_index_skips_malformed_entries() {
        let missions = vec![
            json!("not a record"),
            json!({"title": "no id"}),
            json!({"mission_id": 7}),
            json!({"mission_id": "q2"}),
        ];
        assert_eq!(find_existing_mission_index(&missions, "q2"), Some(3));
        assert_eq!(find_existing_mission_index(&missions, "q9"), None);
    }

    #[test]
    fn process_merges_into_existing_record() {
        let mut state = map(json!({
            "active_missions": [{"mission_id": "q1", "title": "Find the relic", "status": "active"}]
        }));
        let outcome = process_mission_data(
            &mut state,
            "active_missions",
            "q1",
            &map(json!({"status": "in progress", "notes": "__DELETE__"})),
            &markers(),
        );

        assert_eq!(outcome, MissionUpsert::Merged { index: 0 });
        assert_eq!(
            state["active_missions"],
            json!([{"mission_id": "q1", "title": "Find the relic", "status": "in progress"}])
        );
    }

    #[test]
    fn process_appends_new_record_with_injected_id() {
        let mut state = Map::new();
        let outcome = process_mission_data(
            &mut state,
            "active_missions",
            "q2",
            &map(json!({"title": "Escort the merchant"})),
            &markers(),
        );

        assert_eq!(outcome, MissionUpsert::Appended);
        assert_eq!(
            state["active_missions"],
            json!([{"mission_id": "q2", "title": "Escort the merchant"}])
        );
    }

    #[test]
    fn dict_conversion_produces_one_record_per_object_entry() {
        let mut state = Map::new();
        let processed = handle_missions_dict_conversion(
            &mut state,
            "active_missions",
            &map(json!({"quest1": {"title": "X"}})),
            &markers(),
        );

        assert_eq!(processed, 1);
        let missions = state["active_missions"].as_array().unwrap();
        assert_eq!(missions.len(), 1);
        assert_eq!(missions[0]["mission_id"], json!("quest1"));
        assert_eq!(missions[0]["title"], json!("X"));
    }

    #[test]
    fn dict_conversion_skips_non_object_entries_but_keeps_siblings() {
        let mut state = Map::new();
        let processed = handle_missions_dict_conversion(
            &mut state,
            "active_missions",
            &map(json!({"bad": "just a string", "good": {"title": "Y"}, "worse": 3})),
            &markers(),
        );

        assert_eq!(processed, 1);
        assert_eq!(state["active_missions"], json!([{"mission_id": "good", "title": "Y"}]));
    }

    #[test]
    fn conversion_initializes_completed_after_every_branch() {
        for value in [json!([]), json!({"q1": {"title": "A"}}), json!("garbage"), json!(null)] {
            let mut state = Map::new();
            handle_active_missions_conversion(&mut state, "active_missions", &value, &markers());
            assert_eq!(
                state.get("completed_missions"),
                Some(&json!([])),
                "completed_missions missing after converting {value}"
            );
        }
    }

    #[test]
    fn conversion_coerces_unsupported_shapes() {
        let mut state = Map::new();
        let repairs =
            handle_active_missions_conversion(&mut state, "active_missions", &json!(42), &markers());

        assert_eq!(state["active_missions"], json!([]));
        assert!(repairs.contains(&LedgerRepair::Coerced {
            key: "active_missions".into(),
            found: "number"
        }));
    }

    #[test]
    fn conversion_does_not_overwrite_existing_completed_missions() {
        let mut state = map(json!({"completed_missions": [{"mission_id": "old"}]}));
        handle_active_missions_conversion(&mut state, "active_missions", &json!([]), &markers());
        assert_eq!(state["completed_missions"], json!([{"mission_id": "old"}]));
    }

    #[test]
    fn missing_ids_get_unique_generated_ids() {
        let mut state = map(json!({"active_missions": [
            {"title": "A"},
            {"mission_id": "mission-1", "title": "B"},
            {"title": "C"},
            "stray"
        ]}));
        let ids = normalize_mission_ids(&mut state, "active_missions", &markers());

        assert_eq!(ids.assigned, 2);
        assert_eq!(state["active_missions"][0]["mission_id"], json!("mission-2"));
        assert_eq!(state["active_missions"][2]["mission_id"], json!("mission-3"));
    }

    #[test]
    fn ledger_normalize_repairs_dict_shaped_state() {
        let ledger = MissionLedger::default();
        let mut state = map(json!({"active_missions": {"quest1": {"title": "X"}}}));

        assert!(ledger.needs_repair(&state));
        let repairs = ledger.normalize(&mut state);

        assert_eq!(state["active_missions"], json!([{"mission_id": "quest1", "title": "X"}]));
        assert_eq!(state["completed_missions"], json!([]));
        assert!(repairs.contains(&LedgerRepair::InitializedCompleted));
        assert!(!ledger.needs_repair(&state));
    }

    #[test]
    fn ledger_normalize_is_idempotent() {
        let ledger = MissionLedger::default();
        let mut state = map(json!({"active_missions": [{"mission_id": "q1"}], "completed_missions": []}));
        let before = state.clone();

        assert!(!ledger.needs_repair(&state));
        assert!(ledger.normalize(&mut state).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn deletion_sentinel_entries_remove_missions() {
        use loresmith_domain::platform_delete_marker;

        for sentinel in [json!("__DELETE__"), platform_delete_marker()] {
            let mut state = map(json!({"active_missions": [
                {"mission_id": "quest1", "title": "X"},
                {"mission_id": "quest3", "title": "Z"}
            ]}));
            let processed = handle_missions_dict_conversion(
                &mut state,
                "active_missions",
                &map(json!({"quest1": sentinel.clone(), "quest2": sentinel.clone()})),
                &markers(),
            );

            assert_eq!(processed, 1, "sentinel {sentinel}");
            assert_eq!(
                state["active_missions"],
                json!([{"mission_id": "quest3", "title": "Z"}]),
                "sentinel {sentinel}"
            );
        }
    }

    #[test]
    fn nested_sentinels_never_reach_stored_records() {
        let mut state = Map::new();
        process_mission_data(
            &mut state,
            "active_missions",
            "q1",
            &map(json!({"reward": {"gold": 50, "item": {"__sentinel__": "DELETE_FIELD"}}})),
            &markers(),
        );

        assert_eq!(
            state["active_missions"],
            json!([{"mission_id": "q1", "reward": {"gold": 50}}])
        );
    }

    #[test]
    fn duplicate_ids_fold_into_first_record() {
        let ledger = MissionLedger::default();
        let mut state = map(json!({
            "active_missions": [
                {"mission_id": "q1", "title": "A", "status": "active"},
                {"mission_id": "q1", "title": "B"},
                {"mission_id": "q2", "title": "D"}
            ],
            "completed_missions": []
        }));

        assert!(ledger.needs_repair(&state));
        let repairs = ledger.normalize(&mut state);

        assert_eq!(
            state["active_missions"],
            json!([
                {"mission_id": "q1", "title": "B", "status": "active"},
                {"mission_id": "q2", "title": "D"}
            ])
        );
        assert!(repairs.contains(&LedgerRepair::MergedDuplicates {
            key: "active_missions".into(),
            count: 1
        }));
        assert!(!ledger.needs_repair(&state));
    }

    #[test]
    fn numeric_ids_are_kept_as_strings() {
        let ledger = MissionLedger::default();
        let mut state = map(json!({
            "active_missions": [{"mission_id": 7, "title": "C"}, {"title": "E"}],
            "completed_missions": []
        }));

        assert!(ledger.needs_repair(&state));
        let repairs = ledger.normalize(&mut state);

        assert_eq!(
            state["active_missions"],
            json!([
                {"mission_id": "7", "title": "C"},
                {"mission_id": "mission-1", "title": "E"}
            ])
        );
        assert!(repairs.contains(&LedgerRepair::StringifiedIds {
            key: "active_missions".into(),
            count: 1
        }));
        assert!(repairs.contains(&LedgerRepair::AssignedIds {
            key: "active_missions".into(),
            count: 1
        }));
    }

    #[test]
    fn generated_ids_skip_stringified_ones() {
        let mut state = map(json!({"active_missions": [{"title": "A"}, {"mission_id": "mission-1"}]}));
        normalize_mission_ids(&mut state, "active_missions", &markers());

        assert_eq!(state["active_missions"][0]["mission_id"], json!("mission-2"));
    }
}
