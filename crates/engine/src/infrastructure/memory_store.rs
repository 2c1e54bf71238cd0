//! In-memory campaign state storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use loresmith_domain::{CampaignId, GameState};

use crate::infrastructure::ports::{ClockPort, RepoError, StateStore};

/// [`StateStore`] backed by a [`DashMap`], one entry per campaign.
///
/// Saves replace the whole entry, so concurrent writers race and the last
/// save wins.
pub struct InMemoryStateStore {
    states: DashMap<CampaignId, StoredState>,
    clock: Arc<dyn ClockPort>,
}

struct StoredState {
    document: GameState,
    updated_at: DateTime<Utc>,
}

impl InMemoryStateStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            states: DashMap::new(),
            clock,
        }
    }

    /// Seed a campaign without going through the port.
    pub fn insert(&self, campaign: CampaignId, state: GameState) {
        self.states.insert(
            campaign,
            StoredState {
                document: state,
                updated_at: self.clock.now(),
            },
        );
    }

    pub fn updated_at(&self, campaign: CampaignId) -> Option<DateTime<Utc>> {
        self.states.get(&campaign).map(|entry| entry.updated_at)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, campaign: CampaignId) -> Result<Option<GameState>, RepoError> {
        Ok(self
            .states
            .get(&campaign)
            .map(|entry| entry.document.clone()))
    }

    async fn save(&self, campaign: CampaignId, state: &GameState) -> Result<(), RepoError> {
        self.insert(campaign, state.clone());
        tracing::debug!(campaign_id = %campaign, "Saved campaign state in memory");
        Ok(())
    }
}
