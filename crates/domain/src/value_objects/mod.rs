//! Value objects - Immutable objects defined by their attributes

mod change;
mod combatant;
mod npc_significance;

// Proposal shapes and the unified deletion sentinel
pub use change::{
    platform_delete_marker, Change, ChangeTree, DeletionMarkers, APPEND_KEY, DELETE_LITERAL,
};

pub use combatant::{coerce_hit_points, CombatantKind};

// Declarative named-NPC predicate table
pub use npc_significance::{
    classify_npc, classify_with, is_truthy, NpcSignificance, SignificanceRule, GENERIC_ROLES,
    NAMED_NPC_RULES,
};
