use async_trait::async_trait;
use loresmith_domain::{CampaignId, GameState};
use serde_json::Value;

use super::RepoError;

// =============================================================================
// Campaign State Storage
// =============================================================================

/// Persistence for the one state document each campaign owns.
///
/// Writes replace the whole document. Concurrent writers are not serialized;
/// the last save wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current document, or `None` for a campaign with no state yet.
    async fn load(&self, campaign: CampaignId) -> Result<Option<GameState>, RepoError>;

    /// Replace the stored document.
    async fn save(&self, campaign: CampaignId, state: &GameState) -> Result<(), RepoError>;

    /// The backend's own "delete this field" marker, if it has one.
    fn delete_marker(&self) -> Option<Value> {
        None
    }
}
