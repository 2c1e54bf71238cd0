//! Apply an operator directive to a campaign's state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loresmith_domain::{CampaignId, GameState};

use crate::infrastructure::ports::{ClockPort, RepoError, StateStore};
use crate::reconciliation::{CleanupTrigger, Reconciler, Reconciliation};

use super::directive::{parse_directive, DirectiveError, DirectiveKind};

#[derive(Debug, thiserror::Error)]
pub enum ApplyDirectiveError {
    #[error("Text is not a GOD_MODE directive")]
    NotADirective,
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct DirectiveOutcome {
    pub campaign_id: CampaignId,
    pub kind: DirectiveKind,
    pub reconciliation: Reconciliation,
    pub saved: bool,
    pub applied_at: DateTime<Utc>,
}

impl DirectiveOutcome {
    /// Plain-text summary for the operator.
    pub fn summary_text(&self) -> String {
        self.reconciliation.summary.to_text()
    }

    pub fn summary_html(&self) -> String {
        self.reconciliation.summary.to_html()
    }
}

/// Parses a `GOD_MODE_*` directive, reconciles it into the campaign state,
/// and writes the result back.
///
/// A campaign with no stored state starts from an empty document. The store
/// is only written when the document actually changed.
pub struct ApplyDirective {
    store: Arc<dyn StateStore>,
    reconciler: Arc<Reconciler>,
    clock: Arc<dyn ClockPort>,
}

impl ApplyDirective {
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

    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        text: &str,
    ) -> Result<DirectiveOutcome, ApplyDirectiveError> {
        let directive = parse_directive(text)?.ok_or(ApplyDirectiveError::NotADirective)?;

        let current = match self.store.load(campaign_id).await? {
            Some(state) => state,
            None => {
                tracing::info!(campaign_id = %campaign_id, "No stored state, starting from empty document");
                GameState::new()
            }
        };

        let reconciliation = self.reconciler.reconcile(
            &current,
            &directive.changes,
            CleanupTrigger::WhenCombatTouched,
        );

        let saved = reconciliation.changed;
        if saved {
            self.store.save(campaign_id, &reconciliation.state).await?;
        }

        tracing::info!(
            campaign_id = %campaign_id,
            directive = directive.kind.as_str(),
            changes = reconciliation.summary.len(),
            saved,
            "Applied operator directive"
        );

        Ok(DirectiveOutcome {
            campaign_id,
            kind: directive.kind,
            reconciliation,
            saved,
            applied_at: self.clock.now(),
        })
    }
}
