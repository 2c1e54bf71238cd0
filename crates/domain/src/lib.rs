pub mod error;
pub mod game_state;
pub mod ids;
pub mod value_objects;

pub use error::DomainError;

pub use game_state::{json_kind, keys, GameState};

// Re-export ID types
pub use ids::CampaignId;

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    classify_npc, classify_with, coerce_hit_points, is_truthy, platform_delete_marker, Change,
    ChangeTree, CombatantKind, DeletionMarkers, NpcSignificance, SignificanceRule, APPEND_KEY,
    DELETE_LITERAL, GENERIC_ROLES, NAMED_NPC_RULES,
};
