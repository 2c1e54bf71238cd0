//! State reconciliation pipeline.
//!
//! Flow: raw proposal → [`Change`] classification → generic merge → mission
//! ledger hooks → combat cleanup. Every branch has a non-failing fallback, so
//! [`Reconciler::reconcile`] always produces a document.

pub mod combat;
pub mod merge;
pub mod missions;
pub mod path_parser;
pub mod summary;

use std::collections::BTreeSet;

use loresmith_domain::{keys, Change, ChangeTree, DeletionMarkers, GameState};
use serde_json::{Map, Value};

use crate::infrastructure::settings::EngineSettings;

pub use combat::{CleanupReport, CombatLifecycleManager};
pub use merge::merge;
pub use missions::{LedgerRepair, MissionLedger};
pub use path_parser::parse_path_assignments;
pub use summary::{format_changes, format_changes_html, ChangeSummary};

/// When combat cleanup runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupTrigger {
    /// Only when the proposal touches `combat_state`.
    WhenCombatTouched,
    /// Always; used once per player turn to catch stragglers from earlier turns.
    TurnBoundary,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub state: GameState,
    /// Top-level keys named by the proposal.
    pub touched: BTreeSet<String>,
    pub ledger_repairs: Vec<LedgerRepair>,
    pub combat: CleanupReport,
    pub summary: ChangeSummary,
    /// Whether `state` differs from the input document.
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    markers: DeletionMarkers,
    ledger: MissionLedger,
    combat: CombatLifecycleManager,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl Reconciler {
    pub fn new(
        markers: DeletionMarkers,
        ledger_keys: Vec<String>,
        combat: CombatLifecycleManager,
    ) -> Self {
        Self {
            ledger: MissionLedger::new(ledger_keys, markers.clone()),
            markers,
            combat,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        let markers = DeletionMarkers::new()
            .with_literal(settings.delete_literal.clone())
            .with_platform_marker(loresmith_domain::platform_delete_marker());
        Self::new(
            markers,
            settings.ledger_keys.clone(),
            CombatLifecycleManager::new(settings.protected_combatant_types.clone()),
        )
    }

    /// Also treat `marker` as a deletion (the storage platform's sentinel).
    pub fn with_platform_marker(self, marker: Value) -> Self {
        let markers = self.markers.with_platform_marker(marker);
        Self {
            ledger: MissionLedger::new(self.ledger.collection_keys().to_vec(), markers.clone()),
            markers,
            combat: self.combat,
        }
    }

    pub fn markers(&self) -> &DeletionMarkers {
        &self.markers
    }

    pub fn ledger(&self) -> &MissionLedger {
        &self.ledger
    }

    /// Classify a raw proposal once.
    pub fn classify(&self, changes: &Map<String, Value>) -> ChangeTree {
        ChangeTree::from_map(changes.clone(), &self.markers)
    }

    /// Generic merge only, no ledger hooks or combat cleanup.
    pub fn merge(&self, state: &GameState, changes: &Map<String, Value>) -> GameState {
        merge::merge(state, &self.classify(changes))
    }

    /// Merge `changes` into a copy of `state` and restore the document invariants.
    pub fn reconcile(
        &self,
        state: &GameState,
        changes: &Map<String, Value>,
        trigger: CleanupTrigger,
    ) -> Reconciliation {
        let mut reconciled = state.clone();
        let document = reconciled.as_map_mut();
        let mut touched = BTreeSet::new();
        let mut ledger_repairs = Vec::new();

        for (key, raw) in changes {
            touched.insert(key.clone());
            let change = Change::classify(raw.clone(), &self.markers);

            match change {
                Change::Nested(_) if self.ledger.tracks(key) => {
                    ledger_repairs.extend(self.ledger.apply_proposal(document, key, raw));
                }
                change => merge::apply_change(document, key, &change, key),
            }
        }

        let ledger_touched = touched.iter().any(|key| self.ledger.tracks(key));
        if ledger_touched || self.ledger.needs_repair(document) {
            ledger_repairs.extend(self.ledger.normalize(document));
        }

        let combat_touched = touched.contains(keys::COMBAT_STATE);
        let combat = if combat_touched || trigger == CleanupTrigger::TurnBoundary {
            self.combat.cleanup(document)
        } else {
            CleanupReport::default()
        };

        let changed = reconciled != *state;
        tracing::debug!(
            touched = touched.len(),
            ledger_repairs = ledger_repairs.len(),
            combat_processed = combat.processed().len(),
            changed,
            "Reconciled state changes"
        );

        Reconciliation {
            state: reconciled,
            touched,
            ledger_repairs,
            combat,
            summary: ChangeSummary::from_changes(changes),
            changed,
        }
    }
}
