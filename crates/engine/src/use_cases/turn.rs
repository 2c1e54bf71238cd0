//! Apply a narrator turn's proposed state changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loresmith_domain::CampaignId;
use serde_json::{Map, Value};

use crate::infrastructure::ports::{ClockPort, RepoError, StateStore};
use crate::reconciliation::{CleanupTrigger, Reconciler, Reconciliation};

use super::proposal::{extract_state_updates, strip_state_updates};

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub campaign_id: CampaignId,
    /// Whether the turn carried a usable proposal.
    pub proposal_found: bool,
    pub reconciliation: Reconciliation,
    pub saved: bool,
    pub applied_at: DateTime<Utc>,
}

/// Reconciles one turn's proposal into the campaign state.
///
/// Combat cleanup always runs at a turn boundary, even when the proposal is
/// empty, so combatants defeated earlier are not left behind.
pub struct ApplyTurnProposal {
    store: Arc<dyn StateStore>,
    reconciler: Arc<Reconciler>,
    clock: Arc<dyn ClockPort>,
}

impl ApplyTurnProposal {
    pub fn new(
        store: Arc<dyn StateStore>,
        reconciler: Arc<Reconciler>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            reconciler,
            clock,
        }
    }

    /// Apply an already-decoded proposal.
    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        changes: &Map<String, Value>,
    ) -> Result<TurnOutcome, TurnError> {
        self.apply(campaign_id, changes, true).await
    }

    /// Extract the proposal block from narrator text and apply it.
    ///
    /// Returns the outcome and the narrative with the block removed.
    pub async fn execute_response(
        &self,
        campaign_id: CampaignId,
        response: &str,
    ) -> Result<(TurnOutcome, String), TurnError> {
        let proposal = extract_state_updates(response);
        let found = proposal.is_some();
        let changes = proposal.unwrap_or_default();

        let outcome = self.apply(campaign_id, &changes, found).await?;
        Ok((outcome, strip_state_updates(response)))
    }

    async fn apply(
        &self,
        campaign_id: CampaignId,
        changes: &Map<String, Value>,
        proposal_found: bool,
    ) -> Result<TurnOutcome, TurnError> {
        let current = self.store.load(campaign_id).await?.unwrap_or_default();

        let reconciliation =
            self.reconciler
                .reconcile(&current, changes, CleanupTrigger::TurnBoundary);

        let saved = reconciliation.changed;
        if saved {
            self.store.save(campaign_id, &reconciliation.state).await?;
        }

        tracing::info!(
            campaign_id = %campaign_id,
            proposal_found,
            touched = reconciliation.touched.len(),
            purged = reconciliation.combat.purged.len(),
            preserved = reconciliation.combat.preserved.len(),
            saved,
            "Applied turn proposal"
        );

        Ok(TurnOutcome {
            campaign_id,
            proposal_found,
            reconciliation,
            saved,
            applied_at: self.clock.now(),
        })
    }
}
