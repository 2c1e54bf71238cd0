//! Use cases - campaign state orchestration.
//!
//! Each use case loads one state snapshot, reconciles it in-process, and hands
//! the result back to the store in a single write.

pub mod directive;
pub mod god_mode;
pub mod proposal;
pub mod turn;

use std::sync::Arc;

pub use directive::{is_directive, parse_directive, Directive, DirectiveError, DirectiveKind};
pub use god_mode::{ApplyDirective, ApplyDirectiveError, DirectiveOutcome};
pub use proposal::{extract_state_updates, strip_state_updates};
pub use turn::{ApplyTurnProposal, TurnError, TurnOutcome};

/// Container for campaign state use cases.
pub struct StateUseCases {
    pub apply_directive: Arc<ApplyDirective>,
    pub apply_turn: Arc<ApplyTurnProposal>,
}

impl StateUseCases {
    pub fn new(apply_directive: Arc<ApplyDirective>, apply_turn: Arc<ApplyTurnProposal>) -> Self {
        Self {
            apply_directive,
            apply_turn,
        }
    }
}
